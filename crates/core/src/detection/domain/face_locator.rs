use std::error::Error;

use thiserror::Error;

use crate::detection::domain::cascade_classifier::CascadeLoadError;
use crate::detection::domain::head_image::HeadImage;
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("face locator initialization failed: {0}")]
    Initialization(#[from] CascadeLoadError),
    #[error("face locator used before initialization")]
    NotInitialized,
    #[error("head image {index} is degenerate ({width}x{height}, {channels} channels)")]
    PreconditionViolation {
        index: usize,
        width: u32,
        height: u32,
        channels: u8,
    },
    #[error("face search failed on head image {index}: {source}")]
    Search {
        index: usize,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("invalid locator configuration: {0}")]
    InvalidConfig(String),
}

/// Domain interface for finding faces inside head crops.
///
/// `result[i]` holds the faces of `heads[i]`, in coordinates local to that
/// crop. An empty list means no face, never a failure.
pub trait FaceLocator: Send {
    fn detect(&mut self, heads: &[HeadImage]) -> Result<Vec<Vec<Region>>, LocatorError>;
}
