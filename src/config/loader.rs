// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::model::ConfigFile;
use crate::errors::Result;

/// Default config file name, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".chill.toml";

/// JSON config name used by earlier chill releases. It is no longer read.
pub const LEGACY_CONFIG_FILE: &str = ".chill.json";

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`crate::config::validate_config`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load the config file, falling back to defaults.
///
/// A missing file is normal and only noted. A file that exists but cannot be
/// read or parsed is reported as an error and the defaults are used instead.
pub fn load_or_default(path: impl AsRef<Path>) -> ConfigFile {
    let path = path.as_ref();
    match load_from_path(path) {
        Ok(config) => {
            info!("reading options from {:?}", path);
            config
        }
        Err(crate::errors::ChillError::IoError(err)) if err.kind() == ErrorKind::NotFound => {
            info!("no config file at {:?}; using defaults", path);
            if let Some(legacy) = legacy_config_beside(path) {
                warn!(
                    "found {:?}, which is no longer read; move its options to {:?}",
                    legacy, path
                );
            }
            ConfigFile::default()
        }
        Err(err) => {
            error!(error = %err, "failed to load config file {:?}; using defaults", path);
            ConfigFile::default()
        }
    }
}

/// Write `config` to `path` as pretty TOML.
pub fn save_to_path(config: &ConfigFile, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let contents = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    info!("saved options to {:?}", path);
    Ok(())
}

/// The legacy JSON config sitting next to `path`, if there is one.
pub fn legacy_config_beside(path: impl AsRef<Path>) -> Option<PathBuf> {
    let legacy = path.as_ref().with_file_name(LEGACY_CONFIG_FILE);
    legacy.is_file().then_some(legacy)
}
