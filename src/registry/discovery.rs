// src/registry/discovery.rs

//! Turning match rules into a concrete, ordered component list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};

use crate::config::{MatchRule, WorkspaceConfig};
use crate::errors::{CompwatchError, Result};
use crate::fs::FileSystem;
use crate::registry::component::{ComponentInfo, FileEntry};
use crate::registry::filter::ComponentFilter;
use crate::watch::path_utils::{relative_str, to_slash};

/// Apply every rule of `config` against the filesystem under `workspace_root`.
///
/// Rules are applied in order. A root nesting with an already accepted root,
/// or a derived id that is already taken, is skipped with a warning.
pub fn discover_components(
    fs: &dyn FileSystem,
    workspace_root: &Path,
    config: &WorkspaceConfig,
) -> Result<Vec<ComponentInfo>> {
    let mut components: Vec<ComponentInfo> = Vec::new();
    let mut ids: HashSet<String> = HashSet::new();

    for rule in config.rules() {
        for rel_root in rule_roots(fs, workspace_root, rule, config)? {
            let root = workspace_root.join(&rel_root);
            let id = rule.id.clone().unwrap_or_else(|| rel_root.clone());

            if ids.contains(&id) {
                warn!(%id, root = ?root, "component id already taken by an earlier rule; skipping");
                continue;
            }
            if let Some(existing) = components
                .iter()
                .find(|c| c.root.starts_with(&root) || root.starts_with(&c.root))
            {
                warn!(
                    %id,
                    root = ?root,
                    conflicts_with = %existing.id,
                    "component roots may not nest; skipping"
                );
                continue;
            }

            let info = build_component(fs, id, root, rule, config)?;
            ids.insert(info.id.clone());
            components.push(info);
        }
    }

    debug!(count = components.len(), "discovered components");
    Ok(components)
}

/// Build a single component's metadata: its filter and file list.
pub fn build_component(
    fs: &dyn FileSystem,
    id: String,
    root: PathBuf,
    rule: &MatchRule,
    config: &WorkspaceConfig,
) -> Result<ComponentInfo> {
    let patterns = rule.effective_ignore(config.extends());
    let filter = ComponentFilter::build(fs, &root, &patterns, &config.watch().ignored_dirs)?;
    let files = collect_component_files(fs, &root, &filter)?;
    Ok(ComponentInfo {
        id,
        root,
        files,
        filter: Arc::new(filter),
    })
}

/// Recompute an existing component's filter and file list from disk,
/// keeping the ignore patterns it was discovered with.
pub fn refresh_component(fs: &dyn FileSystem, info: &ComponentInfo) -> Result<ComponentInfo> {
    let filter = info.filter.rebuild(fs, &info.root)?;
    let files = collect_component_files(fs, &info.root, &filter)?;
    Ok(ComponentInfo {
        id: info.id.clone(),
        root: info.root.clone(),
        files,
        filter: Arc::new(filter),
    })
}

/// Workspace-relative roots a rule applies to, in sorted order.
fn rule_roots(
    fs: &dyn FileSystem,
    workspace_root: &Path,
    rule: &MatchRule,
    config: &WorkspaceConfig,
) -> Result<Vec<String>> {
    let root = rule.root.trim().trim_end_matches('/').to_string();

    if !rule.is_glob() {
        if fs.is_dir(&workspace_root.join(&root)) {
            return Ok(vec![root]);
        }
        debug!(root = %root, "explicit component root does not exist; skipping");
        return Ok(Vec::new());
    }

    let matcher = GlobBuilder::new(&root)
        .literal_separator(true)
        .build()
        .map_err(|e| CompwatchError::ConfigError(format!("invalid root glob '{root}': {e}")))?
        .compile_matcher();

    let max_depth = if root.contains("**") {
        usize::MAX
    } else {
        root.split('/').count()
    };

    matching_dirs(fs, workspace_root, &matcher, max_depth, &config.watch().ignored_dirs)
}

fn matching_dirs(
    fs: &dyn FileSystem,
    workspace_root: &Path,
    matcher: &GlobMatcher,
    max_depth: usize,
    ignored_dirs: &[String],
) -> Result<Vec<String>> {
    let mut found = Vec::new();
    let mut stack = vec![(workspace_root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        if depth >= max_depth {
            continue;
        }
        for path in fs.read_dir(&dir)? {
            if !fs.is_dir(&path) || is_skipped_dir(&path, ignored_dirs) {
                continue;
            }
            if let Some(rel) = relative_str(workspace_root, &path) {
                if matcher.is_match(&rel) {
                    found.push(rel);
                }
            }
            stack.push((path, depth + 1));
        }
    }

    found.sort();
    Ok(found)
}

fn is_skipped_dir(path: &Path, ignored_dirs: &[String]) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.starts_with('.') || ignored_dirs.iter().any(|d| d == name),
        None => true,
    }
}

/// Collect every non-ignored file under `root`, sorted by relative path.
fn collect_component_files(
    fs: &dyn FileSystem,
    root: &Path,
    filter: &ComponentFilter,
) -> Result<Vec<FileEntry>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            if fs.is_dir(&path) {
                if !filter.is_ignored(rel, true) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && !filter.is_ignored(rel, false) {
                let relative = to_slash(rel);
                files.push(FileEntry {
                    relative,
                    absolute: path,
                });
            }
        }
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}
