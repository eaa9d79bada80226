// src/config/validate.rs

use std::path::Path;

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{ChillError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `directory` exists and is a directory
/// - there is at least one pattern, none of them empty
/// - every pattern is a valid glob
/// - the debounce window is not zero
///
/// It does **not** check that the command exists; a command that cannot be
/// spawned is reported each time a start is attempted.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_directory(cfg)?;
    validate_patterns(cfg)?;
    validate_timings(cfg)?;
    Ok(())
}

fn validate_directory(cfg: &ConfigFile) -> Result<()> {
    let dir = Path::new(&cfg.directory);
    if !dir.exists() {
        return Err(ChillError::ConfigError(format!(
            "directory '{}' does not exist",
            cfg.directory
        )));
    }
    if !dir.is_dir() {
        return Err(ChillError::ConfigError(format!(
            "'{}' is not a directory",
            cfg.directory
        )));
    }
    Ok(())
}

fn validate_patterns(cfg: &ConfigFile) -> Result<()> {
    if cfg.patterns.is_empty() {
        return Err(ChillError::ConfigError(
            "at least one pattern is required".to_string(),
        ));
    }
    for pat in &cfg.patterns {
        if pat.trim().is_empty() {
            return Err(ChillError::ConfigError("patterns must not be empty".to_string()));
        }
        Glob::new(pat).map_err(|e| {
            ChillError::ConfigError(format!("invalid pattern '{pat}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_timings(cfg: &ConfigFile) -> Result<()> {
    if cfg.debounce_ms == 0 {
        return Err(ChillError::ConfigError(
            "debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
