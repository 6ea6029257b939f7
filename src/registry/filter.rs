// src/registry/filter.rs

//! Gitignore-style exclusion for component file lists.

use std::path::{Component as PathComponent, Path};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

use crate::errors::{CompwatchError, Result};
use crate::fs::FileSystem;

/// Name of the per-component ignore file honoured in addition to configured patterns.
pub const COMPONENT_IGNORE_FILE: &str = ".gitignore";

/// Decides which paths under a component root are excluded from its file list.
#[derive(Debug, Clone)]
pub struct ComponentFilter {
    matcher: Gitignore,
    patterns: Vec<String>,
    ignored_dirs: Vec<String>,
}

impl ComponentFilter {
    /// Build a filter rooted at `root` from configured patterns, the root's
    /// own `.gitignore` (if any), and the globally ignored directory names.
    pub fn build(
        fs: &dyn FileSystem,
        root: &Path,
        patterns: &[String],
        ignored_dirs: &[String],
    ) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);

        for pattern in patterns {
            builder.add_line(None, pattern).map_err(|e| {
                CompwatchError::ConfigError(format!(
                    "invalid ignore pattern '{pattern}' for {:?}: {e}",
                    root
                ))
            })?;
        }

        let ignore_file = root.join(COMPONENT_IGNORE_FILE);
        if fs.is_file(&ignore_file) {
            let content = fs.read_to_string(&ignore_file)?;
            for line in content.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                if let Err(e) = builder.add_line(Some(ignore_file.clone()), line) {
                    debug!(file = ?ignore_file, error = %e, "skipping invalid ignore line");
                }
            }
        }

        let matcher = builder.build().map_err(|e| {
            CompwatchError::ConfigError(format!("building ignore matcher for {:?}: {e}", root))
        })?;

        Ok(Self {
            matcher,
            patterns: patterns.to_vec(),
            ignored_dirs: ignored_dirs.to_vec(),
        })
    }

    /// Build again from the same configured inputs, picking up edits to the
    /// root's `.gitignore`.
    pub fn rebuild(&self, fs: &dyn FileSystem, root: &Path) -> Result<Self> {
        Self::build(fs, root, &self.patterns, &self.ignored_dirs)
    }

    /// `rel` must be relative to the filter's root.
    pub fn is_ignored(&self, rel: &Path, is_dir: bool) -> bool {
        if rel.as_os_str().is_empty() {
            return false;
        }
        if self.in_ignored_dir(rel) {
            return true;
        }
        self.matcher
            .matched_path_or_any_parents(rel, is_dir)
            .is_ignore()
    }

    fn in_ignored_dir(&self, rel: &Path) -> bool {
        rel.components().any(|c| match c {
            PathComponent::Normal(name) => self
                .ignored_dirs
                .iter()
                .any(|d| name.to_str() == Some(d.as_str())),
            _ => false,
        })
    }
}
