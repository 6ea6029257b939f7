// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod fs;
pub mod hooks;
pub mod logging;
pub mod registry;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::events::EventBus;
use crate::fs::{FileSystem, RealFileSystem};
use crate::hooks::HookSlots;
use crate::registry::ComponentRegistry;
use crate::watch::{spawn_watcher, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and component discovery
/// - the file watcher and its work queue
/// - report printing
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let registry = ComponentRegistry::open(&args.workspace, fs, HookSlots::new())?;

    if let Some(pattern) = args.list.as_deref() {
        return print_components(&registry, pattern).await;
    }

    let mut options = WatchOptions::from_config(&registry.config());
    if let Some(ms) = args.debounce_ms {
        options = options.with_debounce(Duration::from_millis(ms));
    }
    info!(
        root = ?registry.workspace_root(),
        components = registry.ids().len(),
        debounce_ms = options.debounce.as_millis() as u64,
        "starting watch session"
    );

    let registry = Arc::new(registry);
    let (watcher, raw_rx, mut reports_rx) = spawn_watcher(registry, EventBus::new(), options)?;

    tokio::spawn(async move {
        while let Some(report) = reports_rx.recv().await {
            println!("{report}");
        }
    });

    tokio::select! {
        res = watcher.run(raw_rx) => res?,
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("interrupted; stopping watch session");
        }
    }
    Ok(())
}

/// `--list`: print every component matching `pattern` (all when empty).
/// A non-empty pattern that matches nothing is an error.
async fn print_components(registry: &ComponentRegistry, pattern: &str) -> Result<()> {
    let components = if pattern.is_empty() {
        registry.list().await?
    } else {
        registry.get_many_by_pattern(pattern, true).await?
    };

    println!("components ({}):", components.len());
    for component in &components {
        println!(
            "  - {}  {}  ({} files)",
            component.id,
            component.root.display(),
            component.files.len()
        );
    }

    debug!("listing complete");
    Ok(())
}
