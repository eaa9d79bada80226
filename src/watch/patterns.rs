// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// Compiled set of filename globs.
///
/// Only the final path component is ever matched, so `"*.rs"` matches
/// `/project/src/main.rs` but a pattern containing a separator such as
/// `"src/*.rs"` never matches anything. Matching is case-sensitive and
/// supports `*`, `?` and bracket classes.
#[derive(Clone)]
pub struct PathMatcher {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatcher")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PathMatcher {
    /// Compile `patterns`. Fails on the first invalid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let set = build_globset(&patterns)?;
        Ok(Self { patterns, set })
    }

    /// The source patterns, in the order they were given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the filename of `path` matches any pattern.
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        match path.as_ref().file_name() {
            Some(name) => self.set.is_match(Path::new(name)),
            None => false,
        }
    }
}

/// One-shot form of [`PathMatcher::matches`].
///
/// Invalid patterns never match instead of failing.
pub fn matches<S: AsRef<str>>(path: impl AsRef<Path>, patterns: &[S]) -> bool {
    let Some(name) = path.as_ref().file_name() else {
        return false;
    };
    patterns.iter().any(|pat| {
        Glob::new(pat.as_ref())
            .map(|glob| glob.compile_matcher().is_match(Path::new(name)))
            .unwrap_or(false)
    })
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}
