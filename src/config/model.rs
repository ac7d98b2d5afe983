// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::Result;
use crate::watch::path_utils::normalize;
use crate::watch::{IgnoreSet, WatchConfig, WatchConfigBuilder};

/// Config file name looked up in the current directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG_FILE: &str = "Srcwatch.toml";

/// Artifacts directory used when none is configured, relative to the source
/// directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "web-ext-artifacts";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// source_dir = "."
/// artifacts_dir = "web-ext-artifacts"
/// ignore_files = ["**/*.log", "dist/**"]
/// ```
///
/// All keys are optional. Relative `source_dir` is resolved against the
/// directory holding the config file; relative `artifacts_dir` against the
/// source directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Root of the tree to watch.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Build output; changes below it never trigger.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Extra globs (relative to `source_dir`) to ignore on top of the
    /// built-in heuristic.
    #[serde(default)]
    pub ignore_files: Vec<String>,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            artifacts_dir: default_artifacts_dir(),
            ignore_files: Vec::new(),
        }
    }
}

/// Validated configuration.
///
/// Constructed via `TryFrom<RawConfigFile>` (see `validate.rs`), which checks
/// the invariants before handing out a `ConfigFile`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection) -> Self {
        Self { watch }
    }

    pub fn source_dir(&self) -> &Path {
        &self.watch.source_dir
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.watch.artifacts_dir
    }

    pub fn ignore_files(&self) -> &[String] {
        &self.watch.ignore_files
    }

    /// Resolve relative directories: `source_dir` against `base`, then
    /// `artifacts_dir` against the resolved `source_dir`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        let source_dir = normalize(&base.join(&self.watch.source_dir));
        self.watch.artifacts_dir = normalize(&source_dir.join(&self.watch.artifacts_dir));
        self.watch.source_dir = source_dir;
        self
    }

    pub fn set_source_dir(&mut self, dir: impl Into<PathBuf>) {
        self.watch.source_dir = dir.into();
    }

    pub fn set_artifacts_dir(&mut self, dir: impl Into<PathBuf>) {
        self.watch.artifacts_dir = dir.into();
    }

    pub fn extend_ignore_files(&mut self, patterns: impl IntoIterator<Item = String>) {
        self.watch.ignore_files.extend(patterns);
    }

    /// Compiled ignore globs, or `None` when none are configured.
    pub fn ignore_set(&self) -> Result<Option<IgnoreSet>> {
        if self.watch.ignore_files.is_empty() {
            return Ok(None);
        }
        Ok(Some(IgnoreSet::new(&self.watch.source_dir, &self.watch.ignore_files)?))
    }

    /// Start a [`WatchConfig`] from this file. When ignore globs are set they
    /// become the session's `should_watch_file` predicate.
    pub fn watch_config_builder(&self) -> Result<WatchConfigBuilder> {
        let predicate = self.ignore_set()?.map(IgnoreSet::into_predicate);
        Ok(WatchConfig::builder(&self.watch.source_dir, &self.watch.artifacts_dir)
            .with_predicate(predicate))
    }
}
