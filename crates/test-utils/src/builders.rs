#![allow(dead_code)]

use std::path::PathBuf;

use srcwatch::config::{ConfigFile, RawConfigFile, WatchSection};
use srcwatch::watch::WatchConfig;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
            },
        }
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.watch.source_dir = dir.into();
        self
    }

    pub fn artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.watch.artifacts_dir = dir.into();
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignore_files.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `WatchConfig` with a no-op callback and the default heuristic, for filter
/// tests that never start a session.
pub fn filter_config(source_dir: &str, artifacts_dir: &str) -> WatchConfig {
    WatchConfig::builder(source_dir, artifacts_dir)
        .on_change(|_| {})
        .build()
        .expect("valid watch config")
}

/// Like [`filter_config`] but with a custom `should_watch_file` predicate.
pub fn filter_config_with<F>(source_dir: &str, artifacts_dir: &str, predicate: F) -> WatchConfig
where
    F: Fn(&std::path::Path) -> bool + Send + Sync + 'static,
{
    WatchConfig::builder(source_dir, artifacts_dir)
        .on_change(|_| {})
        .should_watch_file(predicate)
        .build()
        .expect("valid watch config")
}
