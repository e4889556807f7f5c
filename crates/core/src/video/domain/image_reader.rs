use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::timestamp::Timestamp;

/// Reads a single still image into an RGB frame.
pub trait ImageReader: Send {
    /// Decodes the image at `path` and stamps the resulting frame with `stamp`.
    fn read(&self, path: &Path, stamp: Timestamp) -> Result<Frame, Box<dyn std::error::Error>>;
}
