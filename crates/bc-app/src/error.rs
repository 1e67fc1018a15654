//! Error types for the bc-app service layer.

use bc_ensemble::EnsembleError;
use bc_forcing::{AbortReason, ForcingError};
use bc_project::ProjectError;
use bc_results::{BloomDateLogEntry, ResultsError};

/// Failures that end an invocation without a new forecast.
///
/// Member failures never appear here; they are part of a successful
/// forecast's results.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The forcing data cannot be repaired today. The previous forecast
    /// stands.
    #[error("Unrecoverable forcing data gap: {reason}")]
    DataGapUnrecoverable {
        reason: AbortReason,
        last_known_good: Option<Box<BloomDateLogEntry>>,
    },

    #[error("No ensemble member produced a bloom date ({members_failed} failed)")]
    EnsembleNoData {
        members_failed: usize,
        last_known_good: Option<Box<BloomDateLogEntry>>,
    },

    #[error("Observation source error: {0}")]
    Source(String),

    #[error("Forcing data error: {0}")]
    Forcing(#[from] ForcingError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("Ensemble error: {0}")]
    Ensemble(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Forecast to fall back on, when the failure carries one.
    pub fn last_known_good(&self) -> Option<&BloomDateLogEntry> {
        match self {
            Self::DataGapUnrecoverable {
                last_known_good, ..
            }
            | Self::EnsembleNoData {
                last_known_good, ..
            } => last_known_good.as_deref(),
            _ => None,
        }
    }
}

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<EnsembleError> for AppError {
    fn from(err: EnsembleError) -> Self {
        match err {
            EnsembleError::Cancelled => AppError::Cancelled,
            EnsembleError::Configuration(_)
            | EnsembleError::MissingArchive { .. }
            | EnsembleError::MissingForcingFile { .. }
            | EnsembleError::BaseInfile { .. }
            | EnsembleError::ZeroConcurrency
            | EnsembleError::Core(_) => AppError::Configuration(err.to_string()),
            EnsembleError::AlreadyRunning | EnsembleError::ThreadPool(_) => {
                AppError::Ensemble(err.to_string())
            }
        }
    }
}
