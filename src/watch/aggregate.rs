// src/watch/aggregate.rs

//! Turning the raw change stream into debounced batches.
//!
//! Two stages:
//! - [`spawn_matcher`] drops vanished paths, directories and anything the
//!   [`PathMatcher`] rejects, on its own task.
//! - [`gather`] soaks up everything that arrives within a sliding window after
//!   a first change, on the caller's task.

use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::watch::patterns::PathMatcher;

/// Deduplicated, sorted set of paths that changed within one debounce window.
///
/// Never empty: it always holds the change that opened the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    paths: Vec<PathBuf>,
}

impl ChangeBatch {
    fn from_set(set: HashSet<PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = set.into_iter().collect();
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl fmt::Display for ChangeBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.paths.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

/// Spawn the match stage.
///
/// Every incoming path is stat'ed. Paths that no longer exist are dropped
/// silently (the usual delete/rename race), directories are dropped, and
/// files are forwarded once if their filename matches. The output closes
/// when `input` closes.
pub fn spawn_matcher(
    mut input: mpsc::Receiver<PathBuf>,
    matcher: PathMatcher,
) -> mpsc::Receiver<PathBuf> {
    let (tx, rx) = mpsc::channel::<PathBuf>(1);

    tokio::spawn(async move {
        while let Some(path) = input.recv().await {
            if !should_forward(&path, &matcher).await {
                continue;
            }
            if tx.send(path).await.is_err() {
                debug!("matched-change consumer dropped; stopping match stage");
                return;
            }
        }
        debug!("match stage finished (watch stream closed)");
    });

    rx
}

async fn should_forward(path: &Path, matcher: &PathMatcher) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => false,
        Ok(_) => {
            let matched = matcher.matches(path);
            trace!(?path, matched, "filtered change");
            matched
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            trace!(?path, "changed path has been removed");
            false
        }
        Err(err) => {
            debug!(?path, error = %err, "cannot stat changed path; ignoring");
            false
        }
    }
}

/// Why a [`gather`] window ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEnd {
    /// `delay` passed without a new arrival.
    Quiet,
    /// The change stream closed, i.e. watching was aborted.
    Closed,
}

/// Collect `first` plus every path that arrives on `changes` until `delay`
/// passes without a new arrival or the stream closes.
///
/// The window slides: each arrival restarts the timer.
pub async fn gather(
    first: PathBuf,
    changes: &mut mpsc::Receiver<PathBuf>,
    delay: Duration,
) -> (ChangeBatch, WindowEnd) {
    let mut files = HashSet::new();
    files.insert(first);

    let end = loop {
        tokio::select! {
            next = changes.recv() => match next {
                Some(path) => {
                    files.insert(path);
                }
                None => break WindowEnd::Closed,
            },
            _ = sleep(delay) => break WindowEnd::Quiet,
        }
    };

    (ChangeBatch::from_set(files), end)
}
