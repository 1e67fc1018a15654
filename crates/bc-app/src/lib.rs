//! Shared application service layer for bloomcast.
//!
//! One call collects and repairs the forcing data, runs the ensemble and
//! appends the forecast to the bloom date log. Frontends only parse
//! arguments and report the outcome.

pub mod config_service;
pub mod error;
pub mod progress;
pub mod run_service;
pub mod source;

pub use config_service::{load_config, read_history};
pub use error::{AppError, AppResult};
pub use progress::{EnsembleProgress, RunProgressEvent, RunStage};
pub use run_service::{
    MemberFailure, RunOutcome, RunRequest, run_bloomcast, run_bloomcast_with_progress,
};
pub use source::{JsonFileSource, ObservationSource, StaticSource};
