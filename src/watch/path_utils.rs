// src/watch/path_utils.rs

//! Path helpers shared by the filter and the session setup.
//!
//! Everything here except [`absolutize`] and [`canonicalize_lenient`] is
//! purely lexical and never touches the filesystem.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::fs::FileSystem;

/// Lexically normalise a path: drop `.` components and resolve `..` against
/// the preceding component. `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute against the current directory, then normalise it.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)
        .with_context(|| format!("resolving absolute path for {:?}", path))?;
    Ok(normalize(&abs))
}

/// True if `path` is `dir` itself or lies anywhere below it.
///
/// Comparison is component-wise and case-sensitive, so `/a/bc` is not
/// considered to be inside `/a/b`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if `path` is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Canonicalise a path that may not exist yet.
///
/// The longest existing ancestor is canonicalised (resolving symlinks such as
/// `/var -> /private/var`) and the missing tail is re-appended. If nothing
/// along the way can be canonicalised the normalised input is returned.
pub fn canonicalize_lenient(fs: &dyn FileSystem, path: &Path) -> PathBuf {
    let path = normalize(path);
    let mut existing = path.as_path();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        if let Ok(canon) = fs.canonicalize(existing) {
            let mut resolved = canon;
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return path,
        }
    }
}
