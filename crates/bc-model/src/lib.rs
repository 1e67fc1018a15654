//! bc-model: running the SOG simulation for one ensemble member.
//!
//! A [`RunSpec`] is turned into a member infile, the executable is run as a
//! subprocess, and the bloom date is read back from its biology timeseries.

pub mod adapter;
pub mod bloom;
pub mod cancel;
pub mod error;
pub mod infile;
pub mod output;
pub mod process;
pub mod types;

pub use adapter::ModelRunAdapter;
pub use bloom::{BloomCriteria, detect_bloom};
pub use cancel::CancelToken;
pub use error::{ModelError, ModelResult};
pub use infile::{InfileEdit, apply_edit, infile_edits, load_base_infile, materialize_infile};
pub use output::{TimeseriesTable, parse_timeseries, read_timeseries};
pub use process::SogProcessAdapter;
pub use types::{
    BloomPrediction, FailureReason, InitialConditions, MemberOutputs, RunResult, RunSpec,
    RunStatus,
};
