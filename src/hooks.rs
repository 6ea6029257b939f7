// src/hooks.rs

//! Hook slots: ordered per-kind lists of externally registered callbacks.
//!
//! Subsystems register their callbacks once, before the registry is built.
//! The registry then owns an immutable [`HookSlots`] and invokes each list
//! in registration order, one callback at a time.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::registry::Component;
use crate::types::ComponentId;

/// Boxed future returned by every hook.
pub type HookFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'static>>;

/// `onComponentLoad(component) -> optional extension data`.
pub type LoadHook = Arc<dyn Fn(Arc<Component>) -> HookFuture<Option<Value>> + Send + Sync>;

/// `onComponentAdd` / `onComponentChange(component, filePaths) -> result`.
pub type FilesHook = Arc<dyn Fn(Arc<Component>, Vec<PathBuf>) -> HookFuture<Value> + Send + Sync>;

/// `onComponentRemove(componentId) -> result`.
pub type RemoveHook = Arc<dyn Fn(ComponentId) -> HookFuture<Value> + Send + Sync>;

/// A callback together with the name of the subsystem that registered it.
#[derive(Clone)]
pub struct Registered<F> {
    pub owner: String,
    pub callback: F,
}

impl<F> fmt::Debug for Registered<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registered")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// `{hookOwner, result}` pair collected from a trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookResult {
    pub owner: String,
    pub result: Value,
}

#[derive(Clone, Default, Debug)]
pub struct HookSlots {
    on_load: Vec<Registered<LoadHook>>,
    on_add: Vec<Registered<FilesHook>>,
    on_change: Vec<Registered<FilesHook>>,
    on_remove: Vec<Registered<RemoveHook>>,
}

impl HookSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_on_load<F, Fut>(&mut self, owner: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(Arc<Component>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        let callback: LoadHook =
            Arc::new(move |component: Arc<Component>| -> HookFuture<Option<Value>> {
                Box::pin(hook(component))
            });
        self.on_load.push(Registered {
            owner: owner.into(),
            callback,
        });
        self
    }

    pub fn register_on_add<F, Fut>(&mut self, owner: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(Arc<Component>, Vec<PathBuf>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let callback = files_hook(hook);
        self.on_add.push(Registered {
            owner: owner.into(),
            callback,
        });
        self
    }

    pub fn register_on_change<F, Fut>(&mut self, owner: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(Arc<Component>, Vec<PathBuf>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let callback = files_hook(hook);
        self.on_change.push(Registered {
            owner: owner.into(),
            callback,
        });
        self
    }

    pub fn register_on_remove<F, Fut>(&mut self, owner: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(ComponentId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let callback: RemoveHook = Arc::new(move |id: ComponentId| -> HookFuture<Value> {
            Box::pin(hook(id))
        });
        self.on_remove.push(Registered {
            owner: owner.into(),
            callback,
        });
        self
    }

    pub fn on_load(&self) -> &[Registered<LoadHook>] {
        &self.on_load
    }

    pub fn on_add(&self) -> &[Registered<FilesHook>] {
        &self.on_add
    }

    pub fn on_change(&self) -> &[Registered<FilesHook>] {
        &self.on_change
    }

    pub fn on_remove(&self) -> &[Registered<RemoveHook>] {
        &self.on_remove
    }
}

fn files_hook<F, Fut>(hook: F) -> FilesHook
where
    F: Fn(Arc<Component>, Vec<PathBuf>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(
        move |component: Arc<Component>, files: Vec<PathBuf>| -> HookFuture<Value> {
            Box::pin(hook(component, files))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn slots_keep_registration_order_per_kind() {
        let mut slots = HookSlots::new();
        slots
            .register_on_remove("compiler", |id| async move { anyhow::Ok(json!({ "compiler": id })) })
            .register_on_remove("bundler", |id| async move { anyhow::Ok(json!({ "bundler": id })) });

        let owners: Vec<_> = slots.on_remove().iter().map(|h| h.owner.as_str()).collect();
        assert_eq!(owners, vec!["compiler", "bundler"]);
        assert!(slots.on_add().is_empty());

        let first = (slots.on_remove()[0].callback)("button".to_string()).await.unwrap();
        assert_eq!(first, json!({ "compiler": "button" }));
    }
}
