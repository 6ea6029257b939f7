#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use compwatch::hooks::HookSlots;
use compwatch::registry::Component;

/// One observed hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    Load(String),
    Add { id: String, files: Vec<PathBuf> },
    Change { id: String, files: Vec<PathBuf> },
    Remove(String),
}

/// Hooks that record every invocation and can be told to fail or dawdle.
#[derive(Clone, Default)]
pub struct RecordingHooks {
    calls: Arc<Mutex<Vec<HookCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    change_delay: Option<Duration>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every change hook sleep before returning.
    pub fn with_change_delay(mut self, delay: Duration) -> Self {
        self.change_delay = Some(delay);
        self
    }

    /// Make the change hook fail for `id`.
    pub fn fail_change_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    /// Hook slots with one callback of each kind registered under `owner`.
    pub fn slots(&self, owner: &str) -> HookSlots {
        let mut slots = HookSlots::new();

        let me = self.clone();
        slots.register_on_load(owner, move |component: Arc<Component>| {
            let me = me.clone();
            async move {
                me.record(HookCall::Load(component.id.clone()));
                anyhow::Ok(Some(json!({ "files": component.files.len() })))
            }
        });

        let me = self.clone();
        slots.register_on_add(owner, move |component: Arc<Component>, files: Vec<PathBuf>| {
            let me = me.clone();
            async move {
                let _active = me.enter();
                me.record(HookCall::Add {
                    id: component.id.clone(),
                    files: files.clone(),
                });
                anyhow::Ok(json!({ "added": files.len() }))
            }
        });

        let me = self.clone();
        slots.register_on_change(owner, move |component: Arc<Component>, files: Vec<PathBuf>| {
            let me = me.clone();
            async move {
                let _active = me.enter();
                me.record(HookCall::Change {
                    id: component.id.clone(),
                    files: files.clone(),
                });
                if let Some(delay) = me.change_delay {
                    tokio::time::sleep(delay).await;
                }
                if me.failing.lock().unwrap().contains(&component.id) {
                    anyhow::bail!("change hook rejected {}", component.id);
                }
                anyhow::Ok(json!({ "changed": files.len() }))
            }
        });

        let me = self.clone();
        slots.register_on_remove(owner, move |id: String| {
            let me = me.clone();
            async move {
                let _active = me.enter();
                me.record(HookCall::Remove(id.clone()));
                anyhow::Ok(json!({ "removed": id }))
            }
        });

        slots
    }

    fn enter(&self) -> ActiveGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        ActiveGuard(Arc::clone(&self.active))
    }

    fn record(&self, call: HookCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// `(id, files)` of every change hook call, in order.
    pub fn changes(&self) -> Vec<(String, Vec<PathBuf>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HookCall::Change { id, files } => Some((id, files)),
                _ => None,
            })
            .collect()
    }

    pub fn adds(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HookCall::Add { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn removes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HookCall::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HookCall::Load(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Highest number of add/change/remove hooks observed running at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}
