// src/watch/scanner.rs

//! Discovery of the directories that seed the watcher.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::fs::FileSystem;

/// Directory names that belong to version control and are never descended into.
pub const VCS_DIR_NAMES: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

/// Collect every directory under `root` (inclusive) that directly contains
/// at least one source file, i.e. a file whose extension is in `extensions`.
///
/// A directory is never added only because it has subdirectories. Version
/// control directories below `root` are skipped entirely. Directories that
/// cannot be listed are skipped silently together with everything below them.
///
/// The result is sorted and free of duplicates.
pub fn scan_source_dirs<S: AsRef<str>>(
    fs: &dyn FileSystem,
    root: &Path,
    extensions: &[S],
) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                trace!(?dir, error = %err, "cannot read directory; not descending");
                continue;
            }
        };

        // Once the directory qualifies there is no need to look at more files,
        // but subdirectories still have to be queued.
        let mut qualifies = false;
        for path in entries {
            if fs.is_dir(&path) {
                // Symlinked directories could loop back into the tree.
                if !is_vcs_dir(&path) && !fs.is_symlink(&path) {
                    stack.push(path);
                }
            } else if !qualifies && is_source_file(&path, extensions) {
                qualifies = true;
            }
        }

        if qualifies {
            found.insert(dir);
        }
    }

    found.into_iter().collect()
}

fn is_vcs_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| VCS_DIR_NAMES.contains(&name))
}

fn is_source_file<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions
            .iter()
            .any(|want| want.as_ref().trim_start_matches('.') == ext),
        None => false,
    }
}
