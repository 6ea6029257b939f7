// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from `workspace.jsonc`.
///
/// ```jsonc
/// {
///   // applied to every rule that does not opt out
///   "extends": { "ignore": ["*.log"] },
///   "components": [
///     { "root": "components/*" },
///     { "root": "libs/core", "id": "core", "ignore": ["fixtures/"], "extends": false },
///   ],
///   "watch": { "debounceMs": 100 },
/// }
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkspaceConfig {
    /// Inheritable defaults from `"extends"`.
    #[serde(default)]
    pub extends: ExtendsSection,

    /// Ordered match rules. Earlier rules win on conflicts.
    #[serde(default)]
    pub components: Vec<MatchRule>,

    /// Watcher tuning from `"watch"`.
    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration. Construct via `TryFrom<RawWorkspaceConfig>`.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    extends: ExtendsSection,
    components: Vec<MatchRule>,
    watch: WatchSection,
}

impl WorkspaceConfig {
    pub(crate) fn new_unchecked(
        extends: ExtendsSection,
        components: Vec<MatchRule>,
        watch: WatchSection,
    ) -> Self {
        Self {
            extends,
            components,
            watch,
        }
    }

    pub fn extends(&self) -> &ExtendsSection {
        &self.extends
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.components
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self::new_unchecked(
            ExtendsSection::default(),
            Vec::new(),
            WatchSection::default(),
        )
    }
}

/// `"extends"` section: defaults inherited by match rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendsSection {
    /// Gitignore-style patterns excluded from every inheriting component.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// One entry of `"components"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRule {
    /// Workspace-relative root directory, or a glob over directories.
    pub root: String,

    /// Explicit id. Only valid for non-glob roots; defaults to `root`.
    #[serde(default)]
    pub id: Option<String>,

    /// Rule-local ignore patterns.
    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    /// If true, `extends.ignore` is appended to this rule's `ignore`.
    #[serde(default = "default_true")]
    pub extends: bool,
}

impl MatchRule {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            id: None,
            ignore: None,
            extends: true,
        }
    }

    /// True when `root` should be expanded against the filesystem.
    pub fn is_glob(&self) -> bool {
        self.root.contains(['*', '?', '[', '{'])
    }

    /// Effective ignore list given the inherited defaults.
    pub fn effective_ignore(&self, defaults: &ExtendsSection) -> Vec<String> {
        effective_patterns(self.ignore.as_ref(), &defaults.ignore, self.extends)
    }
}

/// Decide the effective pattern list for a rule.
fn effective_patterns(
    rule_list: Option<&Vec<String>>,
    default_list: &[String],
    inherit: bool,
) -> Vec<String> {
    match (rule_list, inherit) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(default_list.iter().cloned());
            combined
        }
        (Some(list), false) => list.clone(),
        (None, true) => default_list.to_vec(),
        (None, false) => Vec::new(),
    }
}

/// `"watch"` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSection {
    /// Debounce window per component, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Directory names never descended into nor reacted to.
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Generated package manifest file name, ignored by the watcher.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ignored_dirs: default_ignored_dirs(),
            manifest: default_manifest(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_ignored_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_manifest() -> String {
    "package.json".to_string()
}
