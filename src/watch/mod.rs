// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind
//!   [`DirWatcher`].
//! - Resolving each changed path to the component whose root contains it.
//! - Debouncing bursts of events per component.
//! - Running every unit of work through a single FIFO queue so component
//!   hooks never overlap.
//!
//! It does **not** know how components are discovered; it asks the
//! [`ComponentRegistry`](crate::registry::ComponentRegistry) for that.

pub mod debounce;
pub mod event_handler;
pub mod path_utils;
pub mod queue;
pub mod source;
pub mod track_dirs;
pub mod watcher;

pub use debounce::Debouncer;
pub use queue::WatchQueue;
pub use source::{DirWatcher, NotifyDirWatcher, RawEventReceiver};
pub use track_dirs::{TrackDirDiff, TrackDirMap};
pub use watcher::{spawn_watcher, WatchOptions, WorkspaceWatcher, WATCHER_SUBSYSTEM};
