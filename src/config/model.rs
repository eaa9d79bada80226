// src/config/model.rs

use serde::{Deserialize, Serialize};

/// Top-level configuration as read from `.chill.toml`.
///
/// ```toml
/// directory = "."
/// patterns = ["*.rs", "*.toml"]
/// command = ["cargo", "run"]
/// extensions = ["rs"]
///
/// settle_ms = 200
/// debounce_ms = 500
/// grace_ms = 2000
/// ```
///
/// All fields are optional and have reasonable defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Directory to watch, relative to the working directory or absolute.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Filename globs; a change triggers a restart if any of them matches.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Program and arguments to supervise. Empty means "watch only".
    #[serde(default)]
    pub command: Vec<String>,

    /// Source file extensions used to pick the directories subscribed at startup.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Delay before the first command start, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Debounce window, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Grace period between stop request and kill, in milliseconds.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

fn default_directory() -> String {
    ".".to_string()
}

fn default_patterns() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["rs".to_string()]
}

fn default_settle_ms() -> u64 {
    200
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_grace_ms() -> u64 {
    2000
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            patterns: default_patterns(),
            command: Vec::new(),
            extensions: default_extensions(),
            settle_ms: default_settle_ms(),
            debounce_ms: default_debounce_ms(),
            grace_ms: default_grace_ms(),
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub directory: Option<String>,
    /// Raw `--pattern` value; split on commas and whitespace.
    pub patterns: Option<String>,
    /// Trailing command arguments; ignored when empty.
    pub command: Vec<String>,
}

impl ConfigFile {
    /// Apply CLI overrides on top of the file values.
    pub fn merge(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(dir) = overrides.directory.as_deref().filter(|d| !d.is_empty()) {
            self.directory = dir.to_string();
        }

        if let Some(patterns) = overrides.patterns.as_deref().map(split_patterns) {
            if !patterns.is_empty() {
                self.patterns = patterns;
            }
        }

        if !overrides.command.is_empty() {
            self.command = overrides.command.clone();
        }

        self
    }
}

/// Split a pattern list like `"*.rs, *.toml *.md"` into its parts.
///
/// Separators are runs of commas and whitespace; duplicates are dropped and
/// the order of first appearance is kept.
pub fn split_patterns(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in pattern_separator().split(raw.trim()) {
        if !part.is_empty() && !out.iter().any(|p| p == part) {
            out.push(part.to_string());
        }
    }
    out
}

fn pattern_separator() -> &'static regex::Regex {
    static SEP: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    SEP.get_or_init(|| regex::Regex::new(r"[,\s]+").expect("static regex is valid"))
}
