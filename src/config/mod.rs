// src/config/mod.rs

//! Configuration file support for the `srcwatch` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate directories and ignore globs (`validate.rs`).
//!
//! Library users can skip this entirely and build a
//! [`crate::watch::WatchConfig`] directly.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_and_validate_with, load_from_path};
pub use model::{ConfigFile, RawConfigFile, WatchSection, DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIG_FILE};
pub use validate::validate_config;
