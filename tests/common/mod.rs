#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use compwatch::errors::Result;
use compwatch::events::EventBus;
use compwatch::fs::RealFileSystem;
use compwatch::registry::ComponentRegistry;
use compwatch::types::{UnitReport, WatchReport};
use compwatch::watch::{DirWatcher, WatchOptions, WorkspaceWatcher};
use compwatch_test_utils::{RecordingHooks, TestWorkspace};

pub use compwatch_test_utils::init_tracing;

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Records watch/unwatch calls instead of touching the OS.
#[derive(Clone, Default)]
pub struct FakeDirWatcher {
    pub watched: Arc<Mutex<Vec<(PathBuf, bool)>>>,
    pub unwatched: Arc<Mutex<Vec<PathBuf>>>,
}

impl DirWatcher for FakeDirWatcher {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<()> {
        self.watched.lock().unwrap().push((path.to_path_buf(), recursive));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.unwatched.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

impl FakeDirWatcher {
    pub fn watched(&self) -> Vec<(PathBuf, bool)> {
        self.watched.lock().unwrap().clone()
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.unwatched.lock().unwrap().clone()
    }
}

pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// A started watcher over a real temp workspace, fed synthetic events.
pub struct Harness {
    pub ws: TestWorkspace,
    pub hooks: RecordingHooks,
    pub registry: Arc<ComponentRegistry>,
    pub watcher: Arc<WorkspaceWatcher>,
    pub dirs: FakeDirWatcher,
    pub events: EventBus,
    pub reports: mpsc::UnboundedReceiver<WatchReport>,
}

impl Harness {
    pub fn start(ws: TestWorkspace, hooks: RecordingHooks) -> Self {
        init_tracing();
        let registry = Arc::new(
            ComponentRegistry::open(ws.root(), Arc::new(RealFileSystem), hooks.slots("test"))
                .expect("workspace should open"),
        );
        let options = WatchOptions::from_config(&registry.config()).with_debounce(DEBOUNCE);
        let dirs = FakeDirWatcher::default();
        let events = EventBus::new();
        let (watcher, reports) = WorkspaceWatcher::new(
            Arc::clone(&registry),
            Box::new(dirs.clone()),
            events.clone(),
            options,
        );
        watcher.start().expect("watcher should start");

        Self {
            ws,
            hooks,
            registry,
            watcher: Arc::new(watcher),
            dirs,
            events,
            reports,
        }
    }

    pub async fn modify(&self, path: PathBuf) {
        let kind = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        self.watcher.handle_event(Event::new(kind).add_path(path)).await;
    }

    pub async fn create(&self, path: PathBuf) {
        let kind = EventKind::Create(CreateKind::File);
        self.watcher.handle_event(Event::new(kind).add_path(path)).await;
    }

    pub async fn remove(&self, path: PathBuf) {
        let kind = EventKind::Remove(RemoveKind::Any);
        self.watcher.handle_event(Event::new(kind).add_path(path)).await;
    }

    /// Wait for every open debounce window and queued unit to finish.
    pub async fn settle(&self) {
        with_timeout(self.watcher.settle()).await;
    }

    /// Next report of any kind.
    pub async fn next_report(&mut self) -> WatchReport {
        with_timeout(self.reports.recv())
            .await
            .expect("report channel closed")
    }

    /// Next unit report, skipping diagnostics.
    pub async fn next_unit(&mut self) -> UnitReport {
        loop {
            if let WatchReport::Unit(report) = self.next_report().await {
                return report;
            }
        }
    }

    /// Reports already delivered.
    pub fn drain(&mut self) -> Vec<WatchReport> {
        let mut out = Vec::new();
        while let Ok(report) = self.reports.try_recv() {
            out.push(report);
        }
        out
    }

    /// Drive the watcher from a raw channel, as production does.
    pub fn spawn_run(
        &self,
    ) -> (
        mpsc::UnboundedSender<notify::Result<Event>>,
        JoinHandle<Result<()>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = Arc::clone(&self.watcher);
        let handle = tokio::spawn(async move { watcher.run(rx).await });
        (tx, handle)
    }
}

pub fn modify_event(path: PathBuf) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path)
}

/// Two glob-discovered components plus a stray file at the root.
pub fn two_component_workspace() -> TestWorkspace {
    compwatch_test_utils::WorkspaceBuilder::new()
        .config(
            r#"{
                // every directory under components/ is a component
                "extends": { "ignore": ["*.log"] },
                "components": [ { "root": "components/*" } ],
            }"#,
        )
        .file("components/button/index.ts", "export {}")
        .file("components/button/style.less", ".btn {}")
        .file("components/card/index.ts", "export {}")
        .file("README.md", "# workspace")
        .build()
}
