// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile, DEFAULT_CONFIG_FILE};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::path_utils::absolutize;

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate or
/// resolve paths. Use [`load_and_validate`] for that.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from disk, validate it, and resolve relative
/// directories against the directory that holds the file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_and_validate_with(&RealFileSystem, path)
}

/// [`load_and_validate`] over an arbitrary filesystem.
pub fn load_and_validate_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(fs, path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.resolved_against(&config_base_dir(path)?))
}

/// Default config path: `Srcwatch.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Directory that relative paths inside the config file refer to.
///
/// A bare file name like `Srcwatch.toml` (parent = "") resolves against the
/// current working directory.
fn config_base_dir(config_path: &Path) -> Result<PathBuf> {
    let abs = absolutize(config_path)?;
    Ok(abs
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}
