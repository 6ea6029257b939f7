// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum MockEntry {
    File(String),
    Dir,
}

/// In-memory filesystem for discovery tests.
///
/// Paths are stored as given; tests are expected to use absolute paths.
/// Parent directories are created implicitly.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        let mut entries = self.entries();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries();
        Self::ensure_dirs(&mut entries, path.as_ref());
    }

    /// Remove a file, or a directory together with everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.entries().retain(|p, _| !p.starts_with(path));
    }

    fn ensure_dirs(entries: &mut BTreeMap<PathBuf, MockEntry>, dir: &Path) {
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.entries().get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::Dir))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries();
        match entries.get(path) {
            Some(MockEntry::Dir) => Ok(entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
