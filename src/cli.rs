// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `compwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "compwatch",
    version,
    about = "Watch a multi-component workspace and report component changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Workspace root containing `workspace.jsonc`.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `COMPWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `watch.debounceMs` from the workspace configuration.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub debounce_ms: Option<u64>,

    /// Print the discovered components and exit. An optional id pattern
    /// (`is:`, `glob:`, `reg:` or bare tokens) narrows the listing.
    #[arg(long, value_name = "PATTERN", num_args = 0..=1, default_missing_value = "")]
    pub list: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
