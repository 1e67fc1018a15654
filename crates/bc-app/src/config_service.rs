//! Configuration loading and run history.

use std::path::Path;

use bc_project::BloomcastConfig;
use bc_results::{BloomDateLog, BloomDateLogEntry};

use crate::error::AppResult;

/// Load, resolve and validate a configuration file.
pub fn load_config(path: &Path) -> AppResult<BloomcastConfig> {
    Ok(bc_project::load_yaml(path)?)
}

/// Every logged forecast for the configuration, oldest first.
pub fn read_history(config: &BloomcastConfig) -> AppResult<Vec<BloomDateLogEntry>> {
    let log = BloomDateLog::open(&config.logging.bloom_date_log)?;
    Ok(log.entries().to_vec())
}
