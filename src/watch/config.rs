// src/watch/config.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{Result, SrcwatchError};
use crate::watch::path_utils::absolutize;

/// Callback invoked once per accepted change, with the changed path.
///
/// Async callers should spawn their own work from inside the callback; the
/// watcher never waits on it.
pub type OnChange = Arc<dyn Fn(PathBuf) + Send + Sync>;

/// Optional override for the default exclusion heuristic.
pub type ShouldWatchFile = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Immutable configuration for one watch session.
///
/// Paths are always absolute and lexically normalised. Build one with
/// [`WatchConfig::builder`].
#[derive(Clone)]
pub struct WatchConfig {
    source_dir: PathBuf,
    artifacts_dir: PathBuf,
    on_change: OnChange,
    should_watch_file: Option<ShouldWatchFile>,
}

impl fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchConfig")
            .field("source_dir", &self.source_dir)
            .field("artifacts_dir", &self.artifacts_dir)
            .field("should_watch_file", &self.should_watch_file.is_some())
            .finish_non_exhaustive()
    }
}

impl WatchConfig {
    pub fn builder(
        source_dir: impl Into<PathBuf>,
        artifacts_dir: impl Into<PathBuf>,
    ) -> WatchConfigBuilder {
        WatchConfigBuilder {
            source_dir: source_dir.into(),
            artifacts_dir: artifacts_dir.into(),
            on_change: None,
            should_watch_file: None,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn should_watch_file(&self) -> Option<&ShouldWatchFile> {
        self.should_watch_file.as_ref()
    }

    pub(crate) fn notify_change(&self, path: PathBuf) {
        (self.on_change)(path)
    }

    /// Swap in directories resolved against the real filesystem (symlinks
    /// followed) once the session knows them.
    pub(crate) fn with_resolved_dirs(mut self, source_dir: PathBuf, artifacts_dir: PathBuf) -> Self {
        self.source_dir = source_dir;
        self.artifacts_dir = artifacts_dir;
        self
    }
}

/// Builder for [`WatchConfig`].
pub struct WatchConfigBuilder {
    source_dir: PathBuf,
    artifacts_dir: PathBuf,
    on_change: Option<OnChange>,
    should_watch_file: Option<ShouldWatchFile>,
}

impl WatchConfigBuilder {
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(PathBuf) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn should_watch_file<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.should_watch_file = Some(Arc::new(f));
        self
    }

    /// Set or clear the predicate from an already shared value.
    pub fn with_predicate(mut self, predicate: Option<ShouldWatchFile>) -> Self {
        self.should_watch_file = predicate;
        self
    }

    pub fn build(self) -> Result<WatchConfig> {
        let on_change = self.on_change.ok_or_else(|| {
            SrcwatchError::ConfigError("on_change callback is required".to_string())
        })?;

        Ok(WatchConfig {
            source_dir: required_dir("source_dir", &self.source_dir)?,
            artifacts_dir: required_dir("artifacts_dir", &self.artifacts_dir)?,
            on_change,
            should_watch_file: self.should_watch_file,
        })
    }
}

fn required_dir(field: &str, path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(SrcwatchError::ConfigError(format!("{field} must not be empty")));
    }
    absolutize(path).map_err(|err| SrcwatchError::ConfigError(format!("{field}: {err:#}")))
}
