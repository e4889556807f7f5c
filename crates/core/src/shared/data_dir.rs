use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{APP_DIR_NAME, DATA_DIR_ENV};

#[derive(Error, Debug)]
pub enum DataDirError {
    #[error("data directory does not exist: {0}")]
    NotFound(PathBuf),
    #[error("could not determine data directory")]
    NoDataDir,
}

/// Resolve the directory holding classifier artifacts.
///
/// Resolution order:
/// 1. Explicit path (e.g. a CLI flag)
/// 2. `FACEWATCH_DATA_DIR` environment variable
/// 3. Platform data directory (`~/.local/share/facewatch` on Linux)
///
/// The first candidate present is returned; it must exist on disk.
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf, DataDirError> {
    resolve_from(explicit, std::env::var_os(DATA_DIR_ENV))
}

/// Platform-specific default data directory.
///
/// - macOS: `~/Library/Application Support/facewatch/`
/// - Linux: `$XDG_DATA_HOME/facewatch/` or `~/.local/share/facewatch/`
/// - Windows: `%APPDATA%/facewatch/`
pub fn default_data_dir() -> Result<PathBuf, DataDirError> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(DataDirError::NoDataDir)
}

fn resolve_from(explicit: Option<&Path>, env_value: Option<OsString>) -> Result<PathBuf, DataDirError> {
    let candidate = match (explicit, env_value) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(value)) if !value.is_empty() => PathBuf::from(value),
        _ => default_data_dir()?,
    };

    if candidate.is_dir() {
        log::debug!("Using data directory {}", candidate.display());
        Ok(candidate)
    } else {
        Err(DataDirError::NotFound(candidate))
    }
}
