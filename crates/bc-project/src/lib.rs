//! bc-project: bloomcast configuration file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_config};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Load, resolve and validate a configuration file.
///
/// Relative paths in the file are taken relative to the file's directory.
pub fn load_yaml(path: &Path) -> ProjectResult<BloomcastConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: BloomcastConfig = serde_yaml::from_str(&content)?;
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    validate_config(&config)?;
    Ok(config)
}

pub fn save_yaml(path: &Path, config: &BloomcastConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
