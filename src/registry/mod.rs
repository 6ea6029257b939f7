// src/registry/mod.rs

//! The component registry: single source of truth for which components
//! exist and which files belong to them.
//!
//! - [`discovery`] applies the configured match rules against the filesystem.
//! - [`filter`] implements gitignore-style exclusion per component.
//! - [`pattern`] parses `is:` / `glob:` / `reg:` / bare-token id patterns.
//! - [`component`] holds the raw and loaded component types.
//!
//! Mutations (`update_component_info`, `reload_config`) are expected to run
//! inside the watch queue. Reads may run at any time and can observe a view
//! that is about to be replaced.

pub mod component;
pub mod discovery;
pub mod filter;
pub mod pattern;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::config::{parse_config, WorkspaceConfig, WORKSPACE_CONFIG_FILE};
use crate::errors::{CompwatchError, Result};
use crate::fs::FileSystem;
use crate::hooks::{HookResult, HookSlots};
use crate::types::ComponentId;

pub use component::{Component, ComponentInfo, FileEntry};
pub use pattern::ComponentPattern;

/// How a path relates to a given component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMembership {
    /// An existing file in the component's file list.
    Member,
    /// A file that no longer exists and is not excluded by the component's filter.
    Deleted,
    /// Excluded by the component's ignore configuration.
    Ignored,
    /// A directory; directories are not file entries.
    Directory,
    /// Unknown id, or the path is outside the component root.
    Outside,
}

pub struct ComponentRegistry {
    workspace_root: PathBuf,
    fs: Arc<dyn FileSystem>,
    hooks: HookSlots,
    config: RwLock<WorkspaceConfig>,
    components: RwLock<Vec<ComponentInfo>>,
    cache: RwLock<HashMap<ComponentId, Arc<Component>>>,
    /// Bumped on every invalidation so an in-flight `get` never caches stale data.
    generation: AtomicU64,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("workspace_root", &self.workspace_root)
            .field("components", &read_lock(&self.components).len())
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    /// Build a registry from an already validated config and discover components.
    pub fn new(
        workspace_root: impl AsRef<Path>,
        fs: Arc<dyn FileSystem>,
        hooks: HookSlots,
        config: WorkspaceConfig,
    ) -> Result<Self> {
        let root = workspace_root.as_ref();
        let workspace_root = fs.canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

        let registry = Self {
            workspace_root,
            fs,
            hooks,
            config: RwLock::new(config),
            components: RwLock::new(Vec::new()),
            cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        };
        registry.update_component_info(None)?;
        Ok(registry)
    }

    /// Read `workspace.jsonc` under `workspace_root` and build the registry.
    pub fn open(
        workspace_root: impl AsRef<Path>,
        fs: Arc<dyn FileSystem>,
        hooks: HookSlots,
    ) -> Result<Self> {
        let root = workspace_root.as_ref();
        let config = read_config(fs.as_ref(), &root.join(WORKSPACE_CONFIG_FILE))?;
        Self::new(root, fs, hooks, config)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config_path(&self) -> PathBuf {
        self.workspace_root.join(WORKSPACE_CONFIG_FILE)
    }

    pub fn config(&self) -> WorkspaceConfig {
        read_lock(&self.config).clone()
    }

    /// Re-read the configuration file. The component list is left untouched
    /// until the next `update_component_info(None)`.
    pub fn reload_config(&self) -> Result<()> {
        let config = read_config(self.fs.as_ref(), &self.config_path())?;
        *write_lock(&self.config) = config;
        info!(path = ?self.config_path(), "workspace configuration reloaded");
        Ok(())
    }

    /// With `None`, discard and rebuild the entire component list from the
    /// current configuration. With an id, recompute only that component's
    /// file list; a component whose root has disappeared is dropped.
    ///
    /// Always invalidates the cached loaded component(s) affected.
    pub fn update_component_info(&self, id: Option<&str>) -> Result<()> {
        match id {
            None => {
                let config = self.config();
                let fresh = discovery::discover_components(
                    self.fs.as_ref(),
                    &self.workspace_root,
                    &config,
                )?;
                *write_lock(&self.components) = fresh;
                self.invalidate(None);
            }
            Some(id) => {
                let current = self.component_info(id);
                match current {
                    None => debug!(%id, "update for unknown component; nothing to recompute"),
                    Some(info) if !self.fs.is_dir(&info.root) => {
                        info!(%id, root = ?info.root, "component root is gone; dropping component");
                        write_lock(&self.components).retain(|c| c.id != id);
                    }
                    Some(info) => {
                        let refreshed = discovery::refresh_component(self.fs.as_ref(), &info)?;
                        let mut components = write_lock(&self.components);
                        if let Some(entry) = components.iter_mut().find(|c| c.id == id) {
                            *entry = refreshed;
                        }
                    }
                }
                self.invalidate(Some(id));
            }
        }
        Ok(())
    }

    fn invalidate(&self, id: Option<&str>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut cache = write_lock(&self.cache);
        match id {
            Some(id) => {
                cache.remove(id);
            }
            None => cache.clear(),
        }
    }

    /// Snapshot of the raw component list, in registry order.
    pub fn component_infos(&self) -> Vec<ComponentInfo> {
        read_lock(&self.components).clone()
    }

    pub fn component_info(&self, id: &str) -> Option<ComponentInfo> {
        read_lock(&self.components)
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn ids(&self) -> Vec<ComponentId> {
        read_lock(&self.components)
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        read_lock(&self.components).iter().any(|c| c.id == id)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        read_lock(&self.cache).contains_key(id)
    }

    /// Classify `path` (absolute) against the component `id`.
    pub fn classify_path(&self, id: &str, path: &Path) -> PathMembership {
        let Some(info) = self.component_info(id) else {
            return PathMembership::Outside;
        };
        if !path.starts_with(&info.root) {
            return PathMembership::Outside;
        }
        if self.fs.is_dir(path) {
            return PathMembership::Directory;
        }
        if info.has_file(path) {
            return PathMembership::Member;
        }
        if info.ignores(path, false) {
            return PathMembership::Ignored;
        }
        if self.fs.exists(path) {
            // Exists, not ignored, but not in the list: the list is stale.
            PathMembership::Member
        } else {
            PathMembership::Deleted
        }
    }

    /// Return the loaded component, running on-load hooks on a cache miss.
    ///
    /// Unknown ids yield `Ok(None)`.
    pub async fn get(&self, id: &str) -> Result<Option<Arc<Component>>> {
        if let Some(hit) = read_lock(&self.cache).get(id) {
            return Ok(Some(Arc::clone(hit)));
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let Some(info) = self.component_info(id) else {
            write_lock(&self.cache).remove(id);
            return Ok(None);
        };

        let mut component = Component::from_info(&info);
        for hook in self.hooks.on_load() {
            let snapshot = Arc::new(component.clone());
            let extension = (hook.callback)(snapshot)
                .await
                .map_err(|source| CompwatchError::HookExecution {
                    owner: hook.owner.clone(),
                    source,
                })?;
            if let Some(data) = extension {
                component.extensions.insert(hook.owner.clone(), data);
            }
        }

        let component = Arc::new(component);
        if self.generation.load(Ordering::SeqCst) == generation {
            write_lock(&self.cache).insert(id.to_string(), Arc::clone(&component));
        } else {
            debug!(%id, "component changed while loading; not caching");
        }
        Ok(Some(component))
    }

    /// Load several components. Any unknown id is an error.
    pub async fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Arc<Component>>> {
        let mut loaded = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let component = self
                .get(id)
                .await?
                .ok_or_else(|| CompwatchError::ComponentNotFound(id.to_string()))?;
            loaded.push(component);
        }
        Ok(loaded)
    }

    /// Load every component, in registry order.
    pub async fn list(&self) -> Result<Vec<Arc<Component>>> {
        let ids = self.ids();
        self.get_many(&ids).await
    }

    /// Ids matching `pattern`, in registry order. Pure read.
    pub fn ids_by_pattern(&self, pattern: &str) -> Result<Vec<ComponentId>> {
        let pattern: ComponentPattern = pattern.parse()?;
        let components = read_lock(&self.components);
        Ok(pattern
            .filter(components.iter().map(|c| c.id.as_str()))
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub async fn get_many_by_pattern(
        &self,
        pattern: &str,
        throw_if_no_match: bool,
    ) -> Result<Vec<Arc<Component>>> {
        let ids = self.ids_by_pattern(pattern)?;
        if ids.is_empty() && throw_if_no_match {
            return Err(CompwatchError::NoPatternMatch(pattern.to_string()));
        }
        self.get_many(&ids).await
    }

    /// Invoke on-add hooks with every file of the component.
    pub async fn trigger_on_component_add(&self, id: &str) -> Result<Vec<HookResult>> {
        let component = self.require(id).await?;
        let files = component.file_paths();
        let mut results = Vec::with_capacity(self.hooks.on_add().len());
        for hook in self.hooks.on_add() {
            let result = (hook.callback)(Arc::clone(&component), files.clone())
                .await
                .map_err(|source| CompwatchError::HookExecution {
                    owner: hook.owner.clone(),
                    source,
                })?;
            results.push(HookResult {
                owner: hook.owner.clone(),
                result,
            });
        }
        Ok(results)
    }

    /// Invoke on-change hooks with the changed files.
    pub async fn trigger_on_component_change(
        &self,
        id: &str,
        files: &[PathBuf],
    ) -> Result<Vec<HookResult>> {
        let component = self.require(id).await?;
        let mut results = Vec::with_capacity(self.hooks.on_change().len());
        for hook in self.hooks.on_change() {
            let result = (hook.callback)(Arc::clone(&component), files.to_vec())
                .await
                .map_err(|source| CompwatchError::HookExecution {
                    owner: hook.owner.clone(),
                    source,
                })?;
            results.push(HookResult {
                owner: hook.owner.clone(),
                result,
            });
        }
        Ok(results)
    }

    /// Invoke on-remove hooks. The component may already be gone from the list.
    pub async fn trigger_on_component_remove(&self, id: &str) -> Result<Vec<HookResult>> {
        let mut results = Vec::with_capacity(self.hooks.on_remove().len());
        for hook in self.hooks.on_remove() {
            let result = (hook.callback)(id.to_string())
                .await
                .map_err(|source| CompwatchError::HookExecution {
                    owner: hook.owner.clone(),
                    source,
                })?;
            results.push(HookResult {
                owner: hook.owner.clone(),
                result,
            });
        }
        Ok(results)
    }

    async fn require(&self, id: &str) -> Result<Arc<Component>> {
        self.get(id)
            .await?
            .ok_or_else(|| CompwatchError::ComponentNotFound(id.to_string()))
    }
}

fn read_config(fs: &dyn FileSystem, path: &Path) -> Result<WorkspaceConfig> {
    let contents = fs.read_to_string(path)?;
    parse_config(&contents)
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use serde_json::json;
    use std::sync::Mutex;

    const CONFIG: &str = r#"{
        "extends": { "ignore": ["*.log"] },
        "components": [{ "root": "components/*" }]
    }"#;

    fn mock_workspace() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/ws/workspace.jsonc", CONFIG);
        fs.add_file("/ws/components/button/index.ts", "");
        fs.add_file("/ws/components/button/style.less", "");
        fs.add_file("/ws/components/card/index.ts", "");
        fs.add_file("/ws/components/avatar/index.ts", "");
        fs
    }

    fn registry(fs: &MockFileSystem, hooks: HookSlots) -> ComponentRegistry {
        ComponentRegistry::open("/ws", Arc::new(fs.clone()), hooks).unwrap()
    }

    #[tokio::test]
    async fn get_caches_and_merges_load_hook_extensions() {
        let fs = mock_workspace();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookSlots::new();
        {
            let calls = Arc::clone(&calls);
            hooks.register_on_load("env", move |c: Arc<Component>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.lock().unwrap().push(format!("env:{}", c.id));
                    anyhow::Ok(Some(json!({ "env": "node" })))
                }
            });
        }
        {
            let calls = Arc::clone(&calls);
            hooks.register_on_load("docs", move |c: Arc<Component>| {
                let calls = Arc::clone(&calls);
                async move {
                    // Sees the extension merged by the previous hook.
                    let saw_env = c.extension("env").is_some();
                    calls.lock().unwrap().push(format!("docs:{saw_env}"));
                    anyhow::Ok(None)
                }
            });
        }
        let registry = registry(&fs, hooks);

        let first = registry.get("components/button").await.unwrap().unwrap();
        assert_eq!(first.extension("env"), Some(&json!({ "env": "node" })));
        assert!(first.extension("docs").is_none());

        let second = registry.get("components/button").await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["env:components/button".to_string(), "docs:true".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_not_error() {
        let fs = mock_workspace();
        let registry = registry(&fs, HookSlots::new());
        assert!(registry.get("components/nope").await.unwrap().is_none());
        assert!(matches!(
            registry.get_many(&["components/nope"]).await,
            Err(CompwatchError::ComponentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_single_component_touches_only_that_entry() {
        let fs = mock_workspace();
        let registry = registry(&fs, HookSlots::new());
        registry.get("components/button").await.unwrap();
        registry.get("components/card").await.unwrap();

        fs.add_file("/ws/components/button/extra.ts", "");
        fs.add_file("/ws/components/card/extra.ts", "");
        registry.update_component_info(Some("components/button")).unwrap();

        assert!(!registry.is_cached("components/button"));
        assert!(registry.is_cached("components/card"));

        let button = registry.component_info("components/button").unwrap();
        assert_eq!(button.files.len(), 3);
        let card = registry.component_info("components/card").unwrap();
        assert_eq!(card.files.len(), 1);
    }

    #[tokio::test]
    async fn full_update_is_idempotent_and_clears_cache() {
        let fs = mock_workspace();
        let registry = registry(&fs, HookSlots::new());
        registry.get("components/card").await.unwrap();

        registry.update_component_info(None).unwrap();
        let first: Vec<_> = registry
            .component_infos()
            .into_iter()
            .map(|c| (c.id, c.files))
            .collect();
        registry.update_component_info(None).unwrap();
        let second: Vec<_> = registry
            .component_infos()
            .into_iter()
            .map(|c| (c.id, c.files))
            .collect();

        assert_eq!(first, second);
        assert!(!registry.is_cached("components/card"));
    }

    #[test]
    fn single_update_rereads_component_gitignore() {
        let fs = mock_workspace();
        fs.add_file("/ws/components/button/a.snap", "");
        let registry = registry(&fs, HookSlots::new());
        let snap = Path::new("/ws/components/button/a.snap");
        assert_eq!(
            registry.classify_path("components/button", snap),
            PathMembership::Member
        );

        fs.add_file("/ws/components/button/.gitignore", "*.snap\n");
        registry.update_component_info(Some("components/button")).unwrap();
        let single: Vec<_> = registry
            .component_info("components/button")
            .unwrap()
            .files
            .into_iter()
            .map(|f| f.relative)
            .collect();
        assert_eq!(single, vec![".gitignore", "index.ts", "style.less"]);
        assert_eq!(
            registry.classify_path("components/button", snap),
            PathMembership::Ignored
        );

        registry.update_component_info(None).unwrap();
        let full: Vec<_> = registry
            .component_info("components/button")
            .unwrap()
            .files
            .into_iter()
            .map(|f| f.relative)
            .collect();
        assert_eq!(single, full);
    }

    #[test]
    fn vanished_root_drops_component() {
        let fs = mock_workspace();
        let registry = registry(&fs, HookSlots::new());
        fs.remove("/ws/components/card");

        registry.update_component_info(Some("components/card")).unwrap();
        assert!(!registry.contains("components/card"));
        assert_eq!(registry.ids(), vec!["components/avatar", "components/button"]);
    }

    #[test]
    fn classify_paths() {
        let fs = mock_workspace();
        fs.add_file("/ws/components/button/trace.log", "");
        let registry = registry(&fs, HookSlots::new());
        let id = "components/button";

        assert_eq!(
            registry.classify_path(id, Path::new("/ws/components/button/index.ts")),
            PathMembership::Member
        );
        assert_eq!(
            registry.classify_path(id, Path::new("/ws/components/button/trace.log")),
            PathMembership::Ignored
        );
        assert_eq!(
            registry.classify_path(id, Path::new("/ws/components/button/gone.ts")),
            PathMembership::Deleted
        );
        assert_eq!(
            registry.classify_path(id, Path::new("/ws/components/button")),
            PathMembership::Directory
        );
        assert_eq!(
            registry.classify_path(id, Path::new("/ws/components/card/index.ts")),
            PathMembership::Outside
        );
    }

    #[tokio::test]
    async fn pattern_lookup_preserves_registry_order() {
        let fs = mock_workspace();
        let registry = registry(&fs, HookSlots::new());

        let ids = registry
            .ids_by_pattern("is:components/card,components/button")
            .unwrap();
        assert_eq!(ids, vec!["components/button", "components/card"]);

        let none = registry.get_many_by_pattern("glob:libs/*", false).await.unwrap();
        assert!(none.is_empty());
        assert!(matches!(
            registry.get_many_by_pattern("glob:libs/*", true).await,
            Err(CompwatchError::NoPatternMatch(_))
        ));
    }

    #[tokio::test]
    async fn failing_hook_propagates_with_owner() {
        let fs = mock_workspace();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookSlots::new();
        hooks.register_on_change("compiler", |_c: Arc<Component>, _f: Vec<PathBuf>| async {
            Err(anyhow::anyhow!("syntax error"))
        });
        {
            let order = Arc::clone(&order);
            hooks.register_on_change("bundler", move |_c: Arc<Component>, _f: Vec<PathBuf>| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push("bundler");
                    anyhow::Ok(json!(null))
                }
            });
        }
        let registry = registry(&fs, hooks);

        let err = registry
            .trigger_on_component_change("components/button", &[])
            .await
            .unwrap_err();
        match err {
            CompwatchError::HookExecution { owner, source } => {
                assert_eq!(owner, "compiler");
                assert!(source.to_string().contains("syntax error"));
            }
            other => panic!("expected HookExecution, got {other:?}"),
        }
        assert!(order.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_hooks_receive_all_files() {
        let fs = mock_workspace();
        let mut hooks = HookSlots::new();
        hooks.register_on_add("compiler", |c: Arc<Component>, files: Vec<PathBuf>| async move {
            anyhow::Ok(json!({ "id": c.id, "files": files.len() }))
        });
        let registry = registry(&fs, hooks);

        let results = registry
            .trigger_on_component_add("components/button")
            .await
            .unwrap();
        assert_eq!(
            results,
            vec![HookResult {
                owner: "compiler".to_string(),
                result: json!({ "id": "components/button", "files": 2 }),
            }]
        );
    }
}
