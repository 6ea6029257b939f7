// src/registry/component.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::registry::filter::ComponentFilter;
use crate::types::ComponentId;

/// A file belonging to a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the component root, with forward slashes.
    pub relative: String,
    /// Absolute path on disk; the content reference handed to hooks.
    pub absolute: PathBuf,
}

/// Raw component metadata produced by discovery.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub root: PathBuf,
    pub files: Vec<FileEntry>,
    pub(crate) filter: Arc<ComponentFilter>,
}

impl ComponentInfo {
    /// True if `path` (absolute) is currently a member file.
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.absolute == path)
    }

    /// True if the component's filter excludes `path` (absolute).
    ///
    /// Paths outside the root are reported as ignored.
    pub fn ignores(&self, path: &Path, is_dir: bool) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rel) => self.filter.is_ignored(rel, is_dir),
            Err(_) => true,
        }
    }
}

/// A loaded component: metadata plus extension data merged from on-load hooks.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub id: ComponentId,
    pub root: PathBuf,
    pub files: Vec<FileEntry>,
    /// Extension data keyed by the owner of the on-load hook that returned it.
    pub extensions: BTreeMap<String, Value>,
}

impl Component {
    pub(crate) fn from_info(info: &ComponentInfo) -> Self {
        Self {
            id: info.id.clone(),
            root: info.root.clone(),
            files: info.files.clone(),
            extensions: BTreeMap::new(),
        }
    }

    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.absolute.clone()).collect()
    }

    pub fn extension(&self, owner: &str) -> Option<&Value> {
        self.extensions.get(owner)
    }
}
