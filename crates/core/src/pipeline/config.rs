use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::locator_config::LocatorConfig;
use crate::fusion::domain::synchronizer::SyncConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level settings file.
///
/// ```json
/// { "locator": { "scale_step": 1.2, "min_neighbors": 2 },
///   "sync": { "queue_depth": 30, "tolerance": 0.1 } }
/// ```
///
/// Missing sections and fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacewatchConfig {
    pub locator: LocatorConfig,
    pub sync: SyncConfig,
}

impl FacewatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FacewatchConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locator
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("locator: {e}")))?;
        self.sync
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("sync: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("facewatch.json");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"locator": {"scale_step": 1.25}}"#);
        let config = FacewatchConfig::load(&path).unwrap();
        assert_relative_eq!(config.locator.scale_step, 1.25);
        assert_eq!(config.locator.min_neighbors, 3);
        assert_eq!(config.sync, SyncConfig::default());
    }

    #[test]
    fn test_full_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{"locator": {"scale_step": 1.2, "min_neighbors": 0,
                            "min_window_width": 24, "min_window_height": 30},
                "sync": {"queue_depth": 5, "tolerance": 0.25}}"#,
        );
        let config = FacewatchConfig::load(&path).unwrap();
        assert_eq!(config.locator.min_neighbors, 0);
        assert_eq!(config.locator.min_window_height, 30);
        assert_eq!(config.sync.queue_depth, 5);
        assert_eq!(config.sync.tolerance, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FacewatchConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "{ locator");
        assert!(matches!(FacewatchConfig::load(&path).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"locator": {"scale_step": 1.0}}"#);
        assert!(matches!(FacewatchConfig::load(&path).unwrap_err(), ConfigError::Invalid(_)));
    }
}
