//! bc-results: ensemble summaries and the bloom date evolution log.

pub mod aggregate;
pub mod stamp;
pub mod store;
pub mod types;

pub use aggregate::{Aggregate, ResultAggregator, percentile_indices};
pub use stamp::DataDateStamp;
pub use store::{BloomDateLog, render_legacy};
pub use types::*;

use std::path::PathBuf;

use bc_core::MemberYear;
use chrono::NaiveDate;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Non-finite biomass {biomass} for member {member} in forecast for {cutoff}")]
    NonFiniteBiomass {
        cutoff: NaiveDate,
        member: MemberYear,
        biomass: f64,
    },

    #[error("Corrupt record at {path}:{line}: {source}")]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
