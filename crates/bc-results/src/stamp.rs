//! Persisted data date between invocations.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ResultsResult;

/// What the previous invocation knew about the forcing data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDateStamp {
    /// Cutoff of the last completed forecast.
    #[serde(default)]
    pub last_run_cutoff: Option<NaiveDate>,
    /// Day whose wind data was missing at the end of the series last time.
    #[serde(default)]
    pub pending_missing_day: Option<NaiveDate>,
}

impl DataDateStamp {
    /// Missing file reads as a fresh stamp.
    pub fn load(path: &Path) -> ResultsResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write through a temporary sibling so a crash never leaves a partial file.
    pub fn save(&self, path: &Path) -> ResultsResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        debug!("Saved data date stamp to {}", path.display());
        Ok(())
    }

    /// True if a forecast has already been made for `cutoff`.
    pub fn already_forecast(&self, cutoff: NaiveDate) -> bool {
        self.last_run_cutoff == Some(cutoff)
    }
}
