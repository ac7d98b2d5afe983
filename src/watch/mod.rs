// src/watch/mod.rs

//! File watching and change filtering.
//!
//! This module is responsible for:
//! - Deciding whether a changed path is interesting ([`filter`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) and running
//!   its events through the filter into the caller's callback
//!   ([`watcher`], [`event_handler`]).
//!
//! It does **not** read file contents or remember anything between
//! sessions; it only turns filesystem notifications into callback calls.

pub mod config;
pub mod event_handler;
pub mod filter;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use config::{OnChange, ShouldWatchFile, WatchConfig, WatchConfigBuilder};
pub use filter::{decide, should_watch_file_combined, Decision, Verdict};
pub use patterns::{default_wants, IgnoreSet, DEFAULT_UNWANTED};
pub use watcher::{start_watching, start_watching_with, validate_source_dir, WatchSession};
