//! Providers of raw observation records.

use std::path::{Path, PathBuf};

use bc_forcing::{ForcingKind, Observation};
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Supplies raw observations for one forcing kind.
///
/// Implementations return only records of the kind's quantities. Dates
/// outside `start..=end` may be included; they are ignored downstream.
pub trait ObservationSource {
    fn fetch(&self, kind: ForcingKind, start: NaiveDate, end: NaiveDate)
    -> AppResult<Vec<Observation>>;
}

fn select(observations: &[Observation], kind: ForcingKind, start: NaiveDate, end: NaiveDate) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| kind.quantities().contains(&o.kind))
        .filter(|o| (start..=end).contains(&o.timestamp.date()))
        .cloned()
        .collect()
}

/// Observations held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    observations: Vec<Observation>,
}

impl StaticSource {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }
}

impl ObservationSource for StaticSource {
    fn fetch(&self, kind: ForcingKind, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<Observation>> {
        Ok(select(&self.observations, kind, start, end))
    }
}

/// A JSON array of observation records on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObservationSource for JsonFileSource {
    fn fetch(&self, kind: ForcingKind, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<Observation>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::Source(format!("{}: {e}", self.path.display())))?;
        let all: Vec<Observation> = serde_json::from_str(&content)
            .map_err(|e| AppError::Source(format!("{}: {e}", self.path.display())))?;
        let selected = select(&all, kind, start, end);
        debug!(
            "Read {} {} observations from {}",
            selected.len(),
            kind,
            self.path.display()
        );
        Ok(selected)
    }
}
