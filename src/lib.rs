// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{
    default_config_path, load_and_validate, validate_config, ConfigFile, RawConfigFile,
    DEFAULT_ARTIFACTS_DIR,
};
use crate::fs::RealFileSystem;
use crate::watch::path_utils::{absolutize, canonicalize_lenient};
use crate::watch::start_watching;

pub use crate::errors::SrcwatchError;
pub use crate::types::{ChangeEvent, ChangeKind, SessionState};
pub use crate::watch::{should_watch_file_combined, WatchConfig, WatchSession};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + command-line overrides
/// - one watch session printing accepted paths to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    debug!(?cfg, "effective configuration");

    let watch_config = cfg
        .watch_config_builder()?
        .on_change(|path: PathBuf| {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", path.display());
        })
        .build()?;

    let session = start_watching(watch_config).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("shutdown requested");
    session.close();
    Ok(())
}

/// Merge the config file (explicit, or `Srcwatch.toml` if present) with
/// command-line flags. Relative flag paths are taken from the current
/// directory.
fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let config_path = args.config.clone().or_else(|| {
        let path = default_config_path();
        path.is_file().then_some(path)
    });

    let mut cfg = match &config_path {
        Some(path) => {
            info!(?path, "loading config file");
            load_and_validate(path)?
        }
        None => {
            let cwd = std::env::current_dir().context("reading current directory")?;
            ConfigFile::try_from(RawConfigFile::default())?.resolved_against(&cwd)
        }
    };

    if let Some(dir) = &args.source_dir {
        let source_dir = absolutize(dir)?;
        // Without a config file the artifacts dir follows the source dir.
        if config_path.is_none() && args.artifacts_dir.is_none() {
            cfg.set_artifacts_dir(source_dir.join(DEFAULT_ARTIFACTS_DIR));
        }
        cfg.set_source_dir(source_dir);
    }

    if let Some(dir) = &args.artifacts_dir {
        cfg.set_artifacts_dir(absolutize(dir)?);
    }

    cfg.extend_ignore_files(args.ignore_files.iter().cloned());
    validate_config(&cfg)?;

    // Ignore globs are matched relative to the source dir, so it has to be
    // spelled the way event paths will be.
    let source_dir = canonicalize_lenient(&RealFileSystem, cfg.source_dir());
    let artifacts_dir = canonicalize_lenient(&RealFileSystem, cfg.artifacts_dir());
    cfg.set_source_dir(source_dir);
    cfg.set_artifacts_dir(artifacts_dir);
    Ok(cfg)
}
