// src/watch/source.rs

//! The raw filesystem subscription, behind a small trait so the watcher can
//! be driven by synthetic events in tests.

use std::path::Path;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::Result;

/// Stream of raw notifications; an `Err` item is a subscription failure.
pub type RawEventReceiver = mpsc::UnboundedReceiver<notify::Result<Event>>;

/// Something that can start and stop watching directories.
pub trait DirWatcher: Send {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<()>;
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// Production [`DirWatcher`] backed by `notify`'s recommended watcher.
///
/// Dropping it stops file watching.
pub struct NotifyDirWatcher {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyDirWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyDirWatcher").finish()
    }
}

impl NotifyDirWatcher {
    /// Create the watcher and the channel its notifications arrive on.
    pub fn new() -> Result<(Self, RawEventReceiver)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        // Called synchronously by notify on its own thread.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // The receiver is gone once the session ends; nothing left to do.
                let _ = event_tx.send(res);
            },
            Config::default(),
        )?;

        Ok((Self { inner }, event_rx))
    }
}

impl DirWatcher for NotifyDirWatcher {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<()> {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        self.inner.watch(path, mode)?;
        debug!(?path, recursive, "watching");
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.inner.unwatch(path)?;
        debug!(?path, "stopped watching");
        Ok(())
    }
}
