// src/watch/event_handler.rs

//! Bodies of the units of work that run inside the watch queue.
//!
//! Every function here returns a [`UnitReport`] instead of an error: a unit
//! that fails is reported and the session carries on.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::events::LifecycleKind;
use crate::registry::PathMembership;
use crate::types::{ComponentId, Diagnostic, UnitKind, UnitReport};
use crate::watch::track_dirs::TrackDirMap;
use crate::watch::watcher::{WatcherShared, WATCHER_SUBSYSTEM};

impl WatcherShared {
    /// Refresh one component and fire its change hooks for the member files
    /// of a debounced batch.
    pub(crate) async fn process_change(&self, id: ComponentId, files: Vec<PathBuf>) -> UnitReport {
        let report = UnitReport::new(UnitKind::Change, Some(id.clone()), files.clone());

        if let Err(err) = self.registry.update_component_info(Some(&id)) {
            error!(%id, error = %err, "failed to refresh component");
            return report.fail(err);
        }

        if !self.registry.contains(&id) {
            if self.track_dirs().dir_of(&id).is_none() {
                debug!(%id, "component already retired; dropping batch");
                return report;
            }
            return self.retire_component(&id).await;
        }

        let mut report = report;
        let mut members = Vec::with_capacity(files.len());
        for path in files {
            match self.registry.classify_path(&id, &path) {
                PathMembership::Member | PathMembership::Deleted => members.push(path),
                PathMembership::Ignored => {
                    let diagnostic = Diagnostic::IgnoredByComponentConfig {
                        id: id.clone(),
                        path,
                    };
                    warn!(%diagnostic, "diagnostic");
                    report.diagnostics.push(diagnostic);
                }
                PathMembership::Directory | PathMembership::Outside => {
                    debug!(%id, ?path, "not a member file; skipping");
                }
            }
        }

        report.files = members.clone();
        if members.is_empty() {
            let diagnostic = Diagnostic::NoMemberFiles { id: id.clone() };
            info!(%diagnostic, "nothing to trigger");
            report.diagnostics.push(diagnostic);
            return report;
        }

        self.events
            .publish(WATCHER_SUBSYSTEM, LifecycleKind::ChangeStarted, &id);
        match self.registry.trigger_on_component_change(&id, &members).await {
            Ok(results) => report.results = results,
            Err(err) => {
                error!(%id, error = %err, "change hooks failed");
                report = report.fail(err);
            }
        }
        report
    }

    /// Stop tracking `id` and fire its remove hooks.
    pub(crate) async fn retire_component(&self, id: &str) -> UnitReport {
        let dir = self.track_dirs_mut().remove_id(id);
        let mut report = UnitReport::new(UnitKind::Remove, Some(id.to_string()), dir.iter().cloned().collect());

        if let Some(dir) = &dir {
            // The directory may already be gone, in which case the OS dropped the watch.
            if let Err(err) = self.source().unwatch(dir) {
                debug!(?dir, error = %err, "unwatch failed");
            }
        }

        self.events
            .publish(WATCHER_SUBSYSTEM, LifecycleKind::Removed, id);
        match self.registry.trigger_on_component_remove(id).await {
            Ok(results) => report.results = results,
            Err(err) => {
                error!(%id, error = %err, "remove hooks failed");
                report = report.fail(err);
            }
        }
        report
    }

    /// Start tracking a newly configured component and fire its add hooks.
    async fn adopt_component(&self, dir: PathBuf, id: ComponentId) -> UnitReport {
        let mut report = UnitReport::new(UnitKind::Add, Some(id.clone()), vec![dir.clone()]);

        if let Err(err) = self.source().watch(&dir, true) {
            error!(%id, ?dir, error = %err, "failed to watch new component");
            return report.fail(err);
        }
        self.track_dirs_mut().insert(dir, id.clone());

        self.events
            .publish(WATCHER_SUBSYSTEM, LifecycleKind::AddStarted, &id);
        match self.registry.trigger_on_component_add(&id).await {
            Ok(results) => report.results = results,
            Err(err) => {
                error!(%id, error = %err, "add hooks failed");
                report = report.fail(err);
            }
        }
        report
    }

    /// Reload the configuration, rebuild the component list, and reconcile
    /// tracked directories. One report per added or removed component, then
    /// a summary report.
    pub(crate) async fn reconfigure(&self) -> Vec<UnitReport> {
        let started = Instant::now();
        let mut summary =
            UnitReport::new(UnitKind::Reconfigure, None, vec![self.config_path.clone()]);

        let refreshed = self
            .registry
            .reload_config()
            .and_then(|()| self.registry.update_component_info(None));
        if let Err(err) = refreshed {
            error!(error = %err, "reconfiguration failed; keeping previous components");
            summary.elapsed = started.elapsed();
            return vec![summary.fail(err)];
        }

        let next = TrackDirMap::from_components(&self.registry.component_infos());
        let diff = self.track_dirs().diff(&next);
        info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            "reconciling tracked directories"
        );

        let mut reports = Vec::with_capacity(diff.added.len() + diff.removed.len() + 1);
        for (_, id) in diff.removed {
            let unit_started = Instant::now();
            let mut report = self.retire_component(&id).await;
            report.elapsed = unit_started.elapsed();
            reports.push(report);
        }
        for (dir, id) in diff.added {
            let unit_started = Instant::now();
            let mut report = self.adopt_component(dir, id).await;
            report.elapsed = unit_started.elapsed();
            reports.push(report);
        }

        summary.elapsed = started.elapsed();
        reports.push(summary);
        reports
    }
}
