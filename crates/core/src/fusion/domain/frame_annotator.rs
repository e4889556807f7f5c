use std::error::Error;

use thiserror::Error;

use crate::fusion::domain::correlated_triple::CorrelatedTriple;
use crate::fusion::domain::messages::DecodeError;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("drawing failed: {0}")]
    Render(#[source] Box<dyn Error + Send + Sync>),
}

/// Renders a correlated triple into a new annotated frame.
///
/// Implementations must not modify the input image and must be pure:
/// the same triple always yields the same pixels.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(&self, triple: &CorrelatedTriple) -> Result<Frame, AnnotationError>;
}
