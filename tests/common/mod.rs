#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for an expected notification to show up.
pub const EVENT_WAIT: Duration = Duration::from_secs(5);

/// How long to keep listening when asserting that nothing (more) arrives.
pub const QUIET: Duration = Duration::from_millis(300);

/// Canonical form of a path inside a temp dir, as the OS reports it in
/// events (e.g. `/private/var/...` on macOS).
pub fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).expect("canonicalize test path")
}
