use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::settings::APP_NAME;

const STORAGE_FILENAME: &str = "storage.json";

/// Where the durable counters and the reader profile live.
/// Creates the directory if it doesn't exist.
pub fn resolve_storage_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Could not determine data directory")?
        .join(APP_NAME);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {data_dir:?}"))?;
    Ok(data_dir.join(STORAGE_FILENAME))
}

/// Uses `state_dir` on platforms that have it, falls back to `cache_dir`.
pub fn resolve_log_path() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine state or cache directory")?;

    let log_dir = base.join(APP_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {log_dir:?}"))?;

    Ok(log_dir.join(format!("{APP_NAME}.log")))
}
