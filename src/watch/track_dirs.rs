// src/watch/track_dirs.rs

//! Mapping from absolute component root directory to component id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::registry::ComponentInfo;
use crate::types::ComponentId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDirMap {
    dirs: BTreeMap<PathBuf, ComponentId>,
}

/// Entries present on only one side of a comparison.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrackDirDiff {
    pub added: Vec<(PathBuf, ComponentId)>,
    pub removed: Vec<(PathBuf, ComponentId)>,
}

impl TrackDirMap {
    pub fn from_components(components: &[ComponentInfo]) -> Self {
        Self {
            dirs: components
                .iter()
                .map(|c| (c.root.clone(), c.id.clone()))
                .collect(),
        }
    }

    pub fn insert(&mut self, dir: PathBuf, id: ComponentId) {
        self.dirs.insert(dir, id);
    }

    /// Drop the entry bound to `id`, returning its directory.
    pub fn remove_id(&mut self, id: &str) -> Option<PathBuf> {
        let dir = self
            .dirs
            .iter()
            .find(|(_, v)| v.as_str() == id)
            .map(|(k, _)| k.clone())?;
        self.dirs.remove(&dir);
        Some(dir)
    }

    pub fn dir_of(&self, id: &str) -> Option<&Path> {
        self.dirs
            .iter()
            .find(|(_, v)| v.as_str() == id)
            .map(|(k, _)| k.as_path())
    }

    /// Walk `path` and its ancestors until one is a tracked directory.
    ///
    /// The path itself is checked first so removing a root resolves to
    /// its own component.
    pub fn resolve(&self, path: &Path) -> Option<&str> {
        path.ancestors()
            .find_map(|dir| self.dirs.get(dir))
            .map(String::as_str)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.keys().map(PathBuf::as_path)
    }

    pub fn contains_dir(&self, dir: &Path) -> bool {
        self.dirs.contains_key(dir)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Compare against `next`. A directory whose id changed appears as a
    /// removal of the old binding plus an addition of the new one.
    pub fn diff(&self, next: &TrackDirMap) -> TrackDirDiff {
        let removed = self
            .dirs
            .iter()
            .filter(|(dir, id)| next.dirs.get(*dir) != Some(*id))
            .map(|(dir, id)| (dir.clone(), id.clone()))
            .collect();
        let added = next
            .dirs
            .iter()
            .filter(|(dir, id)| self.dirs.get(*dir) != Some(*id))
            .map(|(dir, id)| (dir.clone(), id.clone()))
            .collect();
        TrackDirDiff { added, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> TrackDirMap {
        let mut m = TrackDirMap::default();
        for (dir, id) in entries {
            m.insert(PathBuf::from(dir), id.to_string());
        }
        m
    }

    #[test]
    fn resolves_by_walking_up_from_the_path() {
        let m = map(&[("/ws/components/button", "button")]);

        assert_eq!(m.resolve(Path::new("/ws/components/button/src/a/b.ts")), Some("button"));
        assert_eq!(m.resolve(Path::new("/ws/components/button")), Some("button"));
        assert_eq!(m.resolve(Path::new("/ws/components/buttons/x.ts")), None);
        assert_eq!(m.resolve(Path::new("/ws/random/notes.txt")), None);
    }

    #[test]
    fn diff_reports_added_removed_and_rebound() {
        let old = map(&[("/ws/a", "a"), ("/ws/b", "b"), ("/ws/c", "c")]);
        let new = map(&[("/ws/a", "a"), ("/ws/c", "core"), ("/ws/d", "d")]);

        let diff = old.diff(&new);
        assert_eq!(
            diff.removed,
            vec![
                (PathBuf::from("/ws/b"), "b".to_string()),
                (PathBuf::from("/ws/c"), "c".to_string())
            ]
        );
        assert_eq!(
            diff.added,
            vec![
                (PathBuf::from("/ws/c"), "core".to_string()),
                (PathBuf::from("/ws/d"), "d".to_string())
            ]
        );
        assert_eq!(old.diff(&old), TrackDirDiff::default());
    }

    #[test]
    fn remove_id_returns_directory() {
        let mut m = map(&[("/ws/a", "a")]);
        assert_eq!(m.remove_id("a"), Some(PathBuf::from("/ws/a")));
        assert!(m.is_empty());
        assert_eq!(m.remove_id("a"), None);
    }
}
