use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::timestamp::Timestamp;
use crate::video::domain::image_reader::ImageReader;

/// Decodes still images with the `image` crate.
///
/// Every supported format is converted to 8-bit RGB; alpha is dropped.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path, stamp: Timestamp) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)
            .map_err(|e| format!("Failed to read image {}: {e}", path.display()))?
            .to_rgb8();
        log::debug!("Read {} ({}x{})", path.display(), img.width(), img.height());
        Ok(Frame::from_rgb_image(img, stamp))
    }
}
