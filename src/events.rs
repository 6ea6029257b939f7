// src/events.rs

//! Publish/subscribe lifecycle notifications, keyed by subsystem name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::ComponentId;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    ChangeStarted,
    AddStarted,
    Removed,
}

#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub subsystem: String,
    pub kind: LifecycleKind,
    pub id: ComponentId,
    pub timestamp: SystemTime,
}

/// Cloneable handle to a set of per-subsystem broadcast channels.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<LifecycleEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, subsystem: &str) -> broadcast::Sender<LifecycleEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(subsystem.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    pub fn subscribe(&self, subsystem: &str) -> broadcast::Receiver<LifecycleEvent> {
        self.sender(subsystem).subscribe()
    }

    /// Publish an event stamped with the current time.
    pub fn publish(&self, subsystem: &str, kind: LifecycleKind, id: &str) {
        let event = LifecycleEvent {
            subsystem: subsystem.to_string(),
            kind,
            id: id.to_string(),
            timestamp: SystemTime::now(),
        };
        match self.sender(subsystem).send(event) {
            Ok(count) => debug!(subsystem, ?kind, id, subscribers = count, "published"),
            // No receivers, this is fine.
            Err(_) => debug!(subsystem, ?kind, id, "no subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_subsystem() {
        let bus = EventBus::new();
        let mut watcher_rx = bus.subscribe("watcher");
        let mut other_rx = bus.subscribe("compiler");

        bus.publish("watcher", LifecycleKind::ChangeStarted, "button");

        let event = watcher_rx.recv().await.unwrap();
        assert_eq!(event.kind, LifecycleKind::ChangeStarted);
        assert_eq!(event.id, "button");
        assert!(other_rx.try_recv().is_err());
    }
}
