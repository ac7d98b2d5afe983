// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `srcwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "srcwatch",
    version,
    about = "Watch a source tree and print changed paths, skipping build output and editor noise.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// If omitted, `Srcwatch.toml` in the current directory is used when it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to watch recursively. Overrides `[watch].source_dir`.
    #[arg(long, short = 's', value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Build output directory; changes inside it are never reported.
    /// Overrides `[watch].artifacts_dir`.
    #[arg(long, short = 'a', value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Glob (relative to the source dir) to ignore. May be repeated; added to
    /// `[watch].ignore_files`.
    #[arg(long = "ignore-files", short = 'i', value_name = "GLOB")]
    pub ignore_files: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SRCWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
