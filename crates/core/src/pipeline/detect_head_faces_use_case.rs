use thiserror::Error;

use crate::detection::domain::face_locator::{FaceLocator, LocatorError};
use crate::detection::domain::head_image::HeadImage;
use crate::fusion::domain::messages::{
    DecodeError, DetectionArray, HeadCrop, HeadCropArray, HeadDetection, ImageMessage,
};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum DetectHeadFacesError {
    #[error("head crop {index} could not be decoded: {source}")]
    Decode { index: usize, source: DecodeError },
    #[error(transparent)]
    Locator(#[from] LocatorError),
}

/// Head-batch face detection: head crops in, head detections with their
/// face boxes out.
///
/// Face boxes stay local to their head crop; consumers compose them with
/// the head box.
pub struct DetectHeadFacesUseCase {
    locator: Box<dyn FaceLocator>,
}

impl DetectHeadFacesUseCase {
    pub fn new(locator: Box<dyn FaceLocator>) -> Self {
        Self { locator }
    }

    pub fn execute(&mut self, crops: &HeadCropArray) -> Result<DetectionArray, DetectHeadFacesError> {
        let heads = crops
            .heads
            .iter()
            .enumerate()
            .map(|(index, crop)| {
                let pixels = crop
                    .color_image
                    .to_frame()
                    .map_err(|source| DetectHeadFacesError::Decode { index, source })?;
                Ok(HeadImage::new(crop.head_detection, pixels))
            })
            .collect::<Result<Vec<_>, DetectHeadFacesError>>()?;

        let faces = self.locator.detect(&heads)?;
        let head_detections: Vec<HeadDetection> = heads
            .iter()
            .zip(faces)
            .map(|(head, faces)| HeadDetection::new(head.bounds(), faces))
            .collect();

        log::debug!(
            "Frame {}: {} heads, {} faces",
            crops.stamp,
            head_detections.len(),
            head_detections.iter().map(|h| h.face_detections.len()).sum::<usize>()
        );
        Ok(DetectionArray {
            stamp: crops.stamp,
            head_detections,
        })
    }
}

/// Cuts the given head boxes out of `frame`.
///
/// Boxes are trimmed to the frame; boxes entirely outside it are skipped.
pub fn crop_heads(frame: &Frame, heads: &[Region]) -> HeadCropArray {
    let crops = heads
        .iter()
        .filter_map(|&bounds| {
            let crop = HeadImage::crop(frame, bounds);
            if crop.is_none() {
                log::warn!("Head box {bounds:?} lies outside the {}x{} frame", frame.width(), frame.height());
            }
            crop
        })
        .map(|head| HeadCrop {
            head_detection: head.bounds(),
            color_image: ImageMessage::from_frame(head.pixels()),
        })
        .collect();
    HeadCropArray {
        stamp: frame.stamp(),
        heads: crops,
    }
}
