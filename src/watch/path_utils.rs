// src/watch/path_utils.rs

//! Path helpers shared by component discovery and the watcher.

use std::path::Path;

/// Render a relative path with forward slashes, the form glob and ignore
/// patterns are written in.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `path` relative to `root` with forward slashes, or `None` when `path`
/// lies outside `root`.
///
/// `root` itself yields an empty string.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(to_slash)
}
