use std::path::PathBuf;

use bc_core::{BcError, MemberYear};
use bc_forcing::ForcingKind;
use bc_model::ModelError;
use thiserror::Error;

pub type EnsembleResult<T> = Result<T, EnsembleError>;

/// Errors that stop an ensemble before or instead of producing results.
///
/// Individual member failures are never reported here; they are carried
/// in each member's result.
#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing {kind} archive for member {member}: {path}")]
    MissingArchive {
        kind: ForcingKind,
        member: MemberYear,
        path: PathBuf,
    },

    #[error("Missing {kind} forcing file in configuration")]
    MissingForcingFile { kind: ForcingKind },

    #[error("Unusable base infile {path}: {source}")]
    BaseInfile {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Ensemble cancelled")]
    Cancelled,

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Core(#[from] BcError),
}
