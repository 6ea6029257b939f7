// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSONC parsing error: {0}")]
    JsoncError(#[from] serde_json5::Error),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("No components match pattern '{0}'")]
    NoPatternMatch(String),

    /// A registered hook returned an error. Fatal to the unit that ran it.
    #[error("hook '{owner}' failed: {source:#}")]
    HookExecution {
        owner: String,
        #[source]
        source: anyhow::Error,
    },

    /// The underlying filesystem subscription failed. Fatal to the session.
    #[error("file watcher error: {0}")]
    WatcherSource(#[from] notify::Error),

    #[error("watch queue is closed")]
    QueueClosed,

    #[error("queued task aborted before completion")]
    QueueTaskAborted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompwatchError {
    /// Whether this error should end a watch session rather than a single unit.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, CompwatchError::WatcherSource(_))
    }
}

pub type Result<T> = std::result::Result<T, CompwatchError>;
