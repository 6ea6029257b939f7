// src/watch/watcher.rs

use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use crate::config::WorkspaceConfig;
use crate::errors::{CompwatchError, Result};
use crate::events::EventBus;
use crate::registry::ComponentRegistry;
use crate::types::{ComponentId, Diagnostic, UnitKind, UnitReport, WatchReport};
use crate::watch::debounce::Debouncer;
use crate::watch::queue::WatchQueue;
use crate::watch::source::{DirWatcher, NotifyDirWatcher, RawEventReceiver};
use crate::watch::track_dirs::TrackDirMap;

/// Subsystem name lifecycle events are published under.
pub const WATCHER_SUBSYSTEM: &str = "watcher";

/// Tunables for a watch session.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Debounce window per component id.
    pub debounce: Duration,
    /// Paths with any of these directory names are never reacted to.
    pub ignored_dirs: Vec<String>,
    /// Generated manifest file name, never reacted to.
    pub manifest: String,
}

impl WatchOptions {
    pub fn from_config(cfg: &WorkspaceConfig) -> Self {
        let watch = cfg.watch();
        Self {
            debounce: Duration::from_millis(watch.debounce_ms),
            ignored_dirs: watch.ignored_dirs.clone(),
            manifest: watch.manifest.clone(),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from_config(&WorkspaceConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum PathEvent {
    AddOrChange,
    Unlink,
}

/// State shared between the event loop, debounce flushes and queued tasks.
pub(crate) struct WatcherShared {
    pub(crate) registry: Arc<ComponentRegistry>,
    pub(crate) queue: WatchQueue,
    pub(crate) source: Mutex<Box<dyn DirWatcher>>,
    pub(crate) track_dirs: RwLock<TrackDirMap>,
    pub(crate) pending: Debouncer<ComponentId, PathBuf>,
    pub(crate) reconfigurations: AtomicUsize,
    pub(crate) events: EventBus,
    pub(crate) reports: mpsc::UnboundedSender<WatchReport>,
    pub(crate) options: WatchOptions,
    pub(crate) config_path: PathBuf,
}

impl WatcherShared {
    pub(crate) fn source(&self) -> MutexGuard<'_, Box<dyn DirWatcher>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn track_dirs(&self) -> RwLockReadGuard<'_, TrackDirMap> {
        self.track_dirs.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn track_dirs_mut(&self) -> RwLockWriteGuard<'_, TrackDirMap> {
        self.track_dirs.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let in_ignored_dir = path.components().any(|c| match c {
            PathComponent::Normal(name) => self
                .options
                .ignored_dirs
                .iter()
                .any(|d| name.to_str() == Some(d.as_str())),
            _ => false,
        });
        in_ignored_dir
            || path.file_name().and_then(|n| n.to_str()) == Some(self.options.manifest.as_str())
    }

    pub(crate) fn emit(&self, report: UnitReport) {
        match &report.failure {
            Some(failure) => error!(
                kind = %report.kind,
                id = ?report.id,
                failure = %failure,
                "unit failed"
            ),
            None => info!(
                kind = %report.kind,
                id = ?report.id,
                files = report.files.len(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "unit processed"
            ),
        }
        // The receiver is optional; a closed channel just means nobody listens.
        let _ = self.reports.send(WatchReport::Unit(report));
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "diagnostic");
        let _ = self.reports.send(WatchReport::Diagnostic(diagnostic));
    }
}

/// Turns raw filesystem notifications into debounced, serialized component
/// lifecycle triggers.
pub struct WorkspaceWatcher {
    shared: Arc<WatcherShared>,
}

impl std::fmt::Debug for WorkspaceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceWatcher")
            .field("track_dirs", &*self.shared.track_dirs())
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}

impl WorkspaceWatcher {
    /// Build a watcher around `source`. Must be called inside a tokio runtime.
    ///
    /// Returns the receiving end of the per-unit report stream.
    pub fn new(
        registry: Arc<ComponentRegistry>,
        source: Box<dyn DirWatcher>,
        events: EventBus,
        options: WatchOptions,
    ) -> (Self, mpsc::UnboundedReceiver<WatchReport>) {
        let (reports, reports_rx) = mpsc::unbounded_channel();
        let config_path = registry.config_path();
        let shared = WatcherShared {
            registry,
            queue: WatchQueue::new(),
            source: Mutex::new(source),
            track_dirs: RwLock::new(TrackDirMap::default()),
            pending: Debouncer::new(options.debounce),
            reconfigurations: AtomicUsize::new(0),
            events,
            reports,
            options,
            config_path,
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            reports_rx,
        )
    }

    /// Compute the initial tracked directories and start watching them,
    /// plus the directory holding the workspace configuration file.
    pub fn start(&self) -> Result<()> {
        let map = TrackDirMap::from_components(&self.shared.registry.component_infos());
        {
            let mut source = self.shared.source();
            for dir in map.dirs() {
                source.watch(dir, true)?;
            }
            if let Some(config_dir) = self.shared.config_path.parent() {
                if map.resolve(config_dir).is_none() {
                    source.watch(config_dir, false)?;
                }
            }
        }
        info!(components = map.len(), "file watcher started");
        *self.shared.track_dirs_mut() = map;
        Ok(())
    }

    /// Consume raw notifications until the stream ends.
    ///
    /// Unit failures are reported and never end the loop; a failure of the
    /// subscription itself is returned.
    pub async fn run(&self, mut raw: RawEventReceiver) -> Result<()> {
        while let Some(res) = raw.recv().await {
            let event = res.map_err(|err| {
                error!(error = %err, "file watch subscription failed");
                CompwatchError::WatcherSource(err)
            })?;
            self.handle_event(event).await;
        }
        debug!("watcher event loop finished");
        Ok(())
    }

    /// Route every path of one raw notification.
    pub async fn handle_event(&self, event: Event) {
        let kind = match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => PathEvent::AddOrChange,
            EventKind::Remove(_) => PathEvent::Unlink,
            _ => return,
        };
        for path in event.paths {
            self.dispatch_path(path, kind).await;
        }
    }

    async fn dispatch_path(&self, path: PathBuf, kind: PathEvent) {
        if path == self.shared.config_path {
            self.schedule_reconfigure();
            return;
        }
        if self.shared.is_excluded(&path) {
            trace!(?path, "excluded path");
            return;
        }

        if self.shared.reconfigurations.load(Ordering::SeqCst) > 0 {
            debug!(?path, "waiting for reconfiguration before dispatch");
            self.shared.queue.on_idle().await;
        }

        let owner = self.shared.track_dirs().resolve(&path).map(str::to_string);
        let Some(id) = owner else {
            self.shared
                .emit_diagnostic(Diagnostic::NotPartOfAnyComponent { path });
            return;
        };

        debug!(%id, ?path, ?kind, "file event");
        if self.shared.pending.record(id.clone(), path) {
            spawn_flush(Arc::clone(&self.shared), id);
        }
    }

    /// Queue a full reconfiguration. Ordinary dispatch waits for the queue
    /// to drain while one is outstanding.
    fn schedule_reconfigure(&self) {
        info!(path = ?self.shared.config_path, "workspace configuration changed");
        let shared = Arc::clone(&self.shared);
        shared.reconfigurations.fetch_add(1, Ordering::SeqCst);

        let task_shared = Arc::clone(&shared);
        let done = shared.queue.add(async move { task_shared.reconfigure().await });

        tokio::spawn(async move {
            let reports = match done.await {
                Ok(reports) => reports,
                Err(err) => vec![UnitReport::new(UnitKind::Reconfigure, None, Vec::new()).fail(err)],
            };
            shared.reconfigurations.fetch_sub(1, Ordering::SeqCst);
            for report in reports {
                shared.emit(report);
            }
        });
    }

    /// Snapshot of the tracked directories.
    pub fn track_dirs(&self) -> TrackDirMap {
        self.shared.track_dirs().clone()
    }

    pub fn queue(&self) -> &WatchQueue {
        &self.shared.queue
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.shared.registry
    }

    /// Wait until no debounce window is open, no reconfiguration is pending
    /// and the queue is idle.
    pub async fn settle(&self) {
        let poll = (self.shared.options.debounce / 4).max(Duration::from_millis(1));
        loop {
            let quiet = self.shared.pending.open_windows() == 0
                && self.shared.reconfigurations.load(Ordering::SeqCst) == 0
                && self.shared.queue.is_idle();
            if quiet {
                return;
            }
            sleep(poll).await;
        }
    }
}

/// After the debounce delay, snapshot the window for `id` and process it as
/// one queued unit.
fn spawn_flush(shared: Arc<WatcherShared>, id: ComponentId) {
    tokio::spawn(async move {
        sleep(shared.pending.delay()).await;

        let files = shared.pending.take(&id);
        if files.is_empty() {
            return;
        }
        debug!(%id, files = files.len(), "debounce window closed");

        let started = Instant::now();
        let task_shared = Arc::clone(&shared);
        let task_id = id.clone();
        let task_files = files.clone();
        let outcome = shared
            .queue
            .add(async move { task_shared.process_change(task_id, task_files).await })
            .await;

        let mut report = match outcome {
            Ok(report) => report,
            Err(err) => UnitReport::new(UnitKind::Change, Some(id), files).fail(err),
        };
        report.elapsed = started.elapsed();
        shared.emit(report);
    });
}

/// Create a `notify`-backed watcher, start it, and return it together with
/// the raw event stream to pass to [`WorkspaceWatcher::run`] and the report
/// stream.
pub fn spawn_watcher(
    registry: Arc<ComponentRegistry>,
    events: EventBus,
    options: WatchOptions,
) -> Result<(
    WorkspaceWatcher,
    RawEventReceiver,
    mpsc::UnboundedReceiver<WatchReport>,
)> {
    let (source, raw_rx) = NotifyDirWatcher::new()?;
    let (watcher, reports_rx) = WorkspaceWatcher::new(registry, Box::new(source), events, options);
    watcher.start()?;
    Ok((watcher, raw_rx, reports_rx))
}
