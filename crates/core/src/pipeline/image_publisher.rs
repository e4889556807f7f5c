use std::path::PathBuf;

use thiserror::Error;

use crate::fusion::domain::messages::{DecodeError, ImageMessage};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("published image is not decodable: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
    #[error("output channel closed")]
    Closed,
}

/// Sink for annotated images.
pub trait ImagePublisher: Send {
    fn publish(&mut self, image: ImageMessage) -> Result<(), PublishError>;
}
