// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only setup-time variants (`ConfigError`, `InvalidSourceDirectory`,
//! `Subscribe`) ever reach a caller of [`crate::watch::start_watching`].
//! `Notification` and `Teardown` are built inside a running session purely
//! so they can be logged with a consistent shape, then dropped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SrcwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid source directory {path:?}: {reason}")]
    InvalidSourceDirectory { path: PathBuf, reason: String },

    #[error("Failed to subscribe to file changes: {0}")]
    Subscribe(#[source] notify::Error),

    #[error("File notification error: {0}")]
    Notification(#[source] notify::Error),

    #[error("Error releasing file watch: {0}")]
    Teardown(#[source] notify::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SrcwatchError {
    pub(crate) fn invalid_source_dir(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SrcwatchError::InvalidSourceDirectory {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SrcwatchError>;
