//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Everything lives under ~/.sensing-cascade/ unless the config overrides
//! the data directory.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Sensing Cascade directory (~/.sensing-cascade/)
pub fn sensing_cascade_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".sensing-cascade"))
}

/// Get the config file path (~/.sensing-cascade/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(sensing_cascade_dir()?.join("config.json"))
}

/// Default directory for persisted motion and location history
pub fn default_data_dir() -> AppResult<PathBuf> {
    Ok(sensing_cascade_dir()?.join("data"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Sensing Cascade directory, creating if it doesn't exist
pub fn ensure_sensing_cascade_dir() -> AppResult<PathBuf> {
    let path = sensing_cascade_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
