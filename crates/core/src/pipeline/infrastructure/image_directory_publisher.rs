use std::path::{Path, PathBuf};

use crate::fusion::domain::messages::ImageMessage;
use crate::pipeline::image_publisher::{ImagePublisher, PublishError};
use crate::video::domain::image_writer::ImageWriter;

/// Writes each published image to `<dir>/frame_<stamp>.png`.
pub struct ImageDirectoryPublisher {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
    written: Vec<PathBuf>,
}

impl ImageDirectoryPublisher {
    pub fn new(dir: &Path, writer: Box<dyn ImageWriter>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            writer,
            written: Vec::new(),
        }
    }

    /// Files written so far, in publish order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, image: &ImageMessage) -> PathBuf {
        let stamp = image.stamp.as_duration();
        self.dir.join(format!(
            "frame_{:010}_{:09}.png",
            stamp.as_secs(),
            stamp.subsec_nanos()
        ))
    }
}

impl ImagePublisher for ImageDirectoryPublisher {
    fn publish(&mut self, image: ImageMessage) -> Result<(), PublishError> {
        let frame = image.to_frame()?;
        let path = self.path_for(&image);
        self.writer
            .write(&path, &frame)
            .map_err(|e| PublishError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        log::debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
