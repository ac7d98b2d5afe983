// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, WatchSection};
use crate::errors::{Result, SrcwatchError};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SrcwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_watch_section(&raw.watch)?;
        Ok(ConfigFile::new_unchecked(raw.watch))
    }
}

/// Validate a config that may have been modified after loading (e.g. by
/// command-line overrides).
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_dirs_present(
        cfg.source_dir().as_os_str().is_empty(),
        cfg.artifacts_dir().as_os_str().is_empty(),
    )?;
    validate_ignore_files(cfg.ignore_files())
}

fn validate_watch_section(watch: &WatchSection) -> Result<()> {
    ensure_dirs_present(
        watch.source_dir.as_os_str().is_empty(),
        watch.artifacts_dir.as_os_str().is_empty(),
    )?;
    validate_ignore_files(&watch.ignore_files)
}

fn ensure_dirs_present(source_empty: bool, artifacts_empty: bool) -> Result<()> {
    if source_empty {
        return Err(SrcwatchError::ConfigError(
            "[watch].source_dir must not be empty".to_string(),
        ));
    }
    if artifacts_empty {
        return Err(SrcwatchError::ConfigError(
            "[watch].artifacts_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_ignore_files(patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        if pattern.trim().is_empty() {
            return Err(SrcwatchError::ConfigError(
                "[watch].ignore_files must not contain empty patterns".to_string(),
            ));
        }
    }
    build_globset(patterns).map_err(|err| {
        SrcwatchError::ConfigError(format!("[watch].ignore_files: {err:#}"))
    })?;
    Ok(())
}
