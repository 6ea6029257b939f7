// src/types.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::hooks::HookResult;

/// Stable identity of a component, e.g. `"components/button"`.
pub type ComponentId = String;

/// Non-fatal findings produced while resolving file events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The path is not under any tracked component root.
    NotPartOfAnyComponent { path: PathBuf },
    /// The path lives under a component root but its filter excludes it.
    IgnoredByComponentConfig { id: ComponentId, path: PathBuf },
    /// A debounced batch held no member files, so no change hook ran.
    NoMemberFiles { id: ComponentId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NotPartOfAnyComponent { path } => {
                write!(f, "{} is not part of any component", path.display())
            }
            Diagnostic::IgnoredByComponentConfig { id, path } => write!(
                f,
                "{} is ignored by the configuration of component '{}'",
                path.display(),
                id
            ),
            Diagnostic::NoMemberFiles { id } => {
                write!(f, "no member files of component '{id}' changed")
            }
        }
    }
}

/// What kind of work a processed unit represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Change,
    Add,
    Remove,
    Reconfigure,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitKind::Change => "change",
            UnitKind::Add => "add",
            UnitKind::Remove => "remove",
            UnitKind::Reconfigure => "reconfigure",
        };
        f.write_str(s)
    }
}

/// Outcome of one processing unit, as seen by the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub kind: UnitKind,
    pub id: Option<ComponentId>,
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
    pub results: Vec<HookResult>,
    pub diagnostics: Vec<Diagnostic>,
    /// Rendered error chain when the unit failed.
    pub failure: Option<String>,
}

impl UnitReport {
    pub fn new(kind: UnitKind, id: Option<ComponentId>, files: Vec<PathBuf>) -> Self {
        Self {
            kind,
            id,
            files,
            elapsed: Duration::ZERO,
            results: Vec::new(),
            diagnostics: Vec::new(),
            failure: None,
        }
    }

    pub fn fail(mut self, err: impl fmt::Display) -> Self {
        self.failure = Some(err.to_string());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// One line: kind, id, files, elapsed milliseconds, then the failure if any.
impl fmt::Display for UnitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.id.as_deref().unwrap_or("-"))?;
        if !self.files.is_empty() {
            let files: Vec<_> = self.files.iter().map(|p| p.display().to_string()).collect();
            write!(f, " ({})", files.join(", "))?;
        }
        write!(f, " in {}ms", self.elapsed.as_millis())?;
        if let Some(failure) = &self.failure {
            write!(f, " FAILED: {failure}")?;
        }
        Ok(())
    }
}

/// Everything the watcher reports back to whoever started it.
#[derive(Debug, Clone)]
pub enum WatchReport {
    Unit(UnitReport),
    Diagnostic(Diagnostic),
}

impl fmt::Display for WatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchReport::Unit(report) => report.fmt(f),
            WatchReport::Diagnostic(diagnostic) => write!(f, "[diagnostic] {diagnostic}"),
        }
    }
}
