// src/cli.rs

//! Command-line interface.
//!
//! ```text
//! chill [--dir DIR] [--pattern "*.go,*.mod"] [--save] -- go run .
//! ```
//!
//! Flags override the config file; everything after the flags is the
//! command to supervise.

use clap::{Parser, ValueEnum};

use crate::config::{ConfigOverrides, DEFAULT_CONFIG_FILE};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "chill",
    version,
    about = "Restart a command whenever matching files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Config file to read (and write with --save).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Directory to watch.
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<String>,

    /// Filename globs, separated by commas or whitespace.
    #[arg(short, long, value_name = "PATTERNS")]
    pub pattern: Option<String>,

    /// Store the effective options in the config file.
    #[arg(long)]
    pub save: bool,

    /// Log level for every target; overrides CHILL_LOG.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Show the resolved settings and exit without watching.
    #[arg(long)]
    pub dry_run: bool,

    /// Program and arguments to run.
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CliArgs {
    /// The subset of flags that is layered over the config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            directory: self.dir.clone(),
            patterns: self.pattern.clone(),
            command: self.command.clone(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
