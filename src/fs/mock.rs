// src/fs/mock.rs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::FileSystem;
use crate::errors::{ChillError, Result};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(Vec<String>), // child names
    /// A directory whose listing fails, e.g. missing permissions.
    Unreadable,
}

/// In-memory directory tree.
///
/// Paths are stored exactly as given; tests should use one consistent
/// prefix (e.g. `/root`) for every entry.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        entries.insert(path.clone(), MockEntry::File);
        link_to_parent(&mut entries, &path);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        entries
            .entry(path.clone())
            .or_insert_with(|| MockEntry::Dir(Vec::new()));
        link_to_parent(&mut entries, &path);
    }

    /// Mark a directory as existing but impossible to list.
    pub fn add_unreadable_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        entries.insert(path.clone(), MockEntry::Unreadable);
        link_to_parent(&mut entries, &path);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.lock();
        entries.remove(path);
        if let (Some(parent), Some(name)) = (path.parent(), file_name(path)) {
            if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
                children.retain(|c| c != &name);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

/// Register `path` under its parent, creating parent directories as needed.
fn link_to_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let (Some(parent), Some(name)) = (path.parent(), file_name(path)) else {
        return;
    };
    if parent.as_os_str().is_empty() {
        return;
    }

    let created = !entries.contains_key(parent);
    let entry = entries
        .entry(parent.to_path_buf())
        .or_insert_with(|| MockEntry::Dir(Vec::new()));
    if let MockEntry::Dir(children) = entry {
        if !children.contains(&name) {
            children.push(name);
        }
    }

    if created {
        link_to_parent(entries, parent);
    }
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.lock().get(path),
            Some(MockEntry::Dir(_)) | Some(MockEntry::Unreadable)
        )
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::Unreadable) => Err(ChillError::IoError(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ))),
            _ => Err(ChillError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a directory or not found: {:?}", path),
            ))),
        }
    }
}
