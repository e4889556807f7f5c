use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::locator_config::LocatorConfig;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for a trained multi-scale object classifier.
///
/// The artifact is opaque. Implementations search `image` at every scale
/// `config` allows, merge overlapping hits, and return the surviving boxes
/// in image coordinates. Searching may reuse internal buffers, hence
/// `&mut self`.
pub trait CascadeClassifier: Send {
    fn detect_multi_scale(
        &mut self,
        image: &Frame,
        config: &LocatorConfig,
    ) -> Result<Vec<Region>, Box<dyn Error + Send + Sync>>;
}

#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("data directory not found: {0}")]
    MissingDirectory(PathBuf),
    #[error("cascade file not found: {0}")]
    MissingCascade(PathBuf),
    #[error("failed to load cascade {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("cascade {0} holds no classifier")]
    Empty(PathBuf),
}
