// src/watch/patterns.rs

//! Built-in exclusion heuristic and user-supplied ignore globs.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::watch::config::ShouldWatchFile;
use crate::watch::path_utils::{normalize, relative_str};

/// Base-name patterns that are never interesting: editor swap/backup files,
/// OS metadata, and packaged build output.
pub const DEFAULT_UNWANTED: &[&str] = &[
    // vim / emacs / generic editors
    "*.swp",
    "*.swo",
    "*.swx",
    "*~",
    "#*#",
    "*.bak",
    "*.tmp",
    "4913",
    // OS metadata
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // packaged output
    "*.xpi",
    "*.zip",
];

/// Directory names whose whole subtree is skipped.
pub const DEFAULT_SKIPPED_DIRS: &[&str] = &["node_modules"];

static UNWANTED_SET: LazyLock<GlobSet> = LazyLock::new(|| {
    let patterns: Vec<String> = DEFAULT_UNWANTED.iter().map(|p| p.to_string()).collect();
    build_globset(&patterns).unwrap_or_else(|err| {
        warn!(error = %err, "failed to compile built-in unwanted patterns");
        GlobSet::empty()
    })
});

/// Default decision used when the caller supplies no predicate.
///
/// Rejects a path when any component below `source_dir` is hidden (starts
/// with `.`) or is a skipped directory, or when its base name matches one of
/// [`DEFAULT_UNWANTED`]. Components above `source_dir` are ignored; for a
/// path outside `source_dir` only the base name is inspected.
pub fn default_wants(path: &Path, source_dir: &Path) -> bool {
    let names: Vec<&OsStr> = match path.strip_prefix(source_dir) {
        Ok(rel) => rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name),
                _ => None,
            })
            .collect(),
        Err(_) => path.file_name().into_iter().collect(),
    };

    if names.iter().any(|name| is_hidden(name) || is_skipped_dir(name)) {
        return false;
    }

    match names.last() {
        Some(base) => !UNWANTED_SET.is_match(Path::new(base)),
        None => true,
    }
}

// Byte-level so names that are not valid UTF-8 are still classified.
fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
}

fn is_skipped_dir(name: &OsStr) -> bool {
    DEFAULT_SKIPPED_DIRS.iter().any(|dir| name == *dir)
}

/// Caller-defined exclusions layered on top of the default heuristic.
///
/// Globs are matched against the path relative to `source_dir` with forward
/// slashes, e.g. `"dist/**"` or `"**/*.log"`.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    source_dir: PathBuf,
    patterns: Vec<String>,
    set: GlobSet,
}

impl IgnoreSet {
    pub fn new(source_dir: impl AsRef<Path>, patterns: &[String]) -> Result<Self> {
        let set = build_globset(patterns).context("building ignore_files globset")?;
        Ok(Self {
            source_dir: normalize(source_dir.as_ref()),
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True if the path matches one of the ignore globs.
    pub fn is_ignored(&self, path: &Path) -> bool {
        match relative_str(&self.source_dir, path) {
            Some(rel) => self.set.is_match(rel),
            None => self.set.is_match(path),
        }
    }

    /// Ignore globs first, then the default heuristic.
    pub fn wants(&self, path: &Path) -> bool {
        !self.is_ignored(path) && default_wants(path, &self.source_dir)
    }

    /// Turn this set into a `should_watch_file` predicate.
    pub fn into_predicate(self) -> ShouldWatchFile {
        Arc::new(move |path: &Path| self.wants(path))
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
