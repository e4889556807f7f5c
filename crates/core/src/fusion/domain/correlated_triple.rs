use std::time::Duration;

use crate::fusion::domain::messages::{DetectionArray, ImageMessage, RecognitionArray, Stamped};
use crate::shared::timestamp::Timestamp;

/// One recognition set, one detection set and one image judged to belong
/// to the same instant.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedTriple {
    pub recognitions: RecognitionArray,
    pub detections: DetectionArray,
    pub image: ImageMessage,
}

impl CorrelatedTriple {
    pub fn new(recognitions: RecognitionArray, detections: DetectionArray, image: ImageMessage) -> Self {
        Self {
            recognitions,
            detections,
            image,
        }
    }

    /// The image stamp, which annotated output inherits.
    pub fn stamp(&self) -> Timestamp {
        self.image.stamp
    }

    /// Distance between the earliest and latest member stamps.
    pub fn spread(&self) -> Duration {
        let stamps = [self.recognitions.stamp(), self.detections.stamp(), self.image.stamp()];
        let lo = stamps.iter().min().copied().unwrap_or_default();
        let hi = stamps.iter().max().copied().unwrap_or_default();
        hi.abs_diff(lo)
    }
}

impl From<(RecognitionArray, DetectionArray, ImageMessage)> for CorrelatedTriple {
    fn from((recognitions, detections, image): (RecognitionArray, DetectionArray, ImageMessage)) -> Self {
        Self::new(recognitions, detections, image)
    }
}
