//! bc-ensemble: building and running the ensemble of simulation members.

pub mod error;
pub mod runspec;
pub mod scheduler;

pub use bc_model::CancelToken;
pub use error::{EnsembleError, EnsembleResult};
pub use runspec::{RunSpecBuilder, member_path};
pub use scheduler::{EnsembleScheduler, SchedulerState};
