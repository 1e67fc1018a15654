//! Ensemble member inputs and outcomes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bc_core::MemberYear;
use bc_forcing::ForcingKind;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialConditions {
    pub ctd_in: PathBuf,
    pub nutrients_in: PathBuf,
}

/// Per-member timeseries outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOutputs {
    pub std_bio_ts: PathBuf,
    pub std_phys_ts: PathBuf,
    pub std_chem_ts: Option<PathBuf>,
}

/// Everything needed to run one ensemble member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub member: MemberYear,
    pub base_infile: PathBuf,
    /// Last day of real forcing data.
    pub cutoff: NaiveDate,
    pub run_start: NaiveDateTime,
    pub run_end: NaiveDateTime,
    /// Filled real-data forcing files, shared by all members.
    pub forcing_files: BTreeMap<ForcingKind, PathBuf>,
    /// Historical continuation files for this member's year.
    pub archive_files: BTreeMap<ForcingKind, PathBuf>,
    pub initial_conditions: InitialConditions,
    pub member_infile: PathBuf,
    pub outputs: MemberOutputs,
    pub timeout: Duration,
}

impl RunSpec {
    /// File receiving the simulation's stdout and stderr.
    pub fn stdout_path(&self) -> PathBuf {
        let mut name = self.member_infile.clone().into_os_string();
        name.push(".stdout");
        PathBuf::from(name)
    }
}

/// Bloom date and the biomass on that date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomPrediction {
    pub date: NaiveDate,
    /// Micro phytoplankton biomass, uM N.
    pub biomass: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    ExecutableError { detail: String },
    OutputParseError { detail: String },
    Timeout { after: Duration },
    Cancelled,
}

impl FailureReason {
    /// Short category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutableError { .. } => "executable error",
            Self::OutputParseError { .. } => "output parse error",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutableError { detail } | Self::OutputParseError { detail } => {
                write!(f, "{}: {}", self.as_str(), detail)
            }
            Self::Timeout { after } => write!(f, "timeout after {} s", after.as_secs()),
            Self::Cancelled => f.write_str(self.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Succeeded(BloomPrediction),
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub spec: RunSpec,
    pub status: RunStatus,
    pub elapsed_s: f64,
}

impl RunResult {
    pub fn succeeded(spec: RunSpec, prediction: BloomPrediction, elapsed_s: f64) -> Self {
        Self {
            spec,
            status: RunStatus::Succeeded(prediction),
            elapsed_s,
        }
    }

    pub fn failed(spec: RunSpec, reason: FailureReason, elapsed_s: f64) -> Self {
        Self {
            spec,
            status: RunStatus::Failed(reason),
            elapsed_s,
        }
    }

    pub fn member(&self) -> MemberYear {
        self.spec.member
    }

    pub fn prediction(&self) -> Option<BloomPrediction> {
        match &self.status {
            RunStatus::Succeeded(p) => Some(*p),
            RunStatus::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.status {
            RunStatus::Failed(reason) => Some(reason),
            RunStatus::Succeeded(_) => None,
        }
    }
}
