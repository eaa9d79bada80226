// src/config/mod.rs

//! Configuration loading and validation for chill.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and CLI overrides (`model.rs`).
//! - Load / save the config file (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Resolve everything into the [`Settings`] the runner is built from.

pub mod loader;
pub mod model;
pub mod validate;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::error;

pub use loader::{
    legacy_config_beside, load_from_path, load_or_default, save_to_path, DEFAULT_CONFIG_FILE,
    LEGACY_CONFIG_FILE,
};
pub use model::{split_patterns, ConfigFile, ConfigOverrides};
pub use validate::validate_config;

use crate::engine::{RunnerConfig, RunnerOptions};
use crate::errors::Result;
use crate::exec::CommandSpec;
use crate::watch::PathMatcher;

/// Validated, resolved configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub matcher: PathMatcher,
    pub extensions: Vec<String>,
    pub command: Option<CommandSpec>,
    pub options: RunnerOptions,
}

impl Settings {
    /// Validate `cfg` and resolve it: absolute root, compiled patterns.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        validate_config(cfg)?;

        let root = resolve_root(Path::new(&cfg.directory))?;
        let matcher = PathMatcher::new(&cfg.patterns)?;

        Ok(Self {
            root,
            matcher,
            extensions: cfg.extensions.clone(),
            command: CommandSpec::from_argv(&cfg.command),
            options: RunnerOptions {
                settle_delay: Duration::from_millis(cfg.settle_ms),
                debounce: Duration::from_millis(cfg.debounce_ms),
                grace: Duration::from_millis(cfg.grace_ms),
            },
        })
    }

    /// Split into the runner's share and the command.
    pub fn into_parts(self) -> (RunnerConfig, Option<CommandSpec>) {
        let runner = RunnerConfig {
            root: self.root,
            matcher: self.matcher,
            extensions: self.extensions,
            options: self.options,
        };
        (runner, self.command)
    }
}

/// Load the config file at `path`, apply `overrides`, optionally save the
/// merged result back, and resolve it into [`Settings`].
///
/// Saving is best-effort: a failed save is logged and startup continues.
pub fn resolve(path: &Path, overrides: &ConfigOverrides, save: bool) -> Result<(ConfigFile, Settings)> {
    let cfg = load_or_default(path).merge(overrides);

    if save {
        if let Err(err) = save_to_path(&cfg, path) {
            error!(error = %err, "failed to save config file {:?}", path);
        }
    }

    let settings = Settings::from_config(&cfg)?;
    Ok((cfg, settings))
}

fn resolve_root(dir: &Path) -> Result<PathBuf> {
    match dir.canonicalize() {
        Ok(abs) => Ok(abs),
        // best-effort
        Err(_) => Ok(std::path::absolute(dir)?),
    }
}
