// src/config/mod.rs

//! Workspace configuration loading and validation.
//!
//! Responsibilities:
//! - Define the JSONC-backed data model (`model.rs`).
//! - Parse `workspace.jsonc` text (`loader.rs`); the registry reads the file
//!   through its `FileSystem`.
//! - Validate static invariants like root shape and id uniqueness (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{parse_config, WORKSPACE_CONFIG_FILE};
pub use model::{
    ExtendsSection, MatchRule, RawWorkspaceConfig, WatchSection, WorkspaceConfig,
};
