//! Simulation adapter errors.

use std::path::PathBuf;

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Base infile {path} is not a YAML mapping")]
    InfileNotMapping { path: PathBuf },

    #[error("Infile key {key} cannot be set: {reason}")]
    InfileKey { key: String, reason: String },

    #[error("Malformed timeseries output: {detail}")]
    Timeseries { detail: String },

    #[error("Timeseries output has no field named '{field}'")]
    MissingField { field: String },

    #[error("No bloom found: {detail}")]
    NoBloom { detail: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
