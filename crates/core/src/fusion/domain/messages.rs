//! Stream messages consumed and produced by the fusion stage.
//!
//! Field shapes follow the upstream detector and recognizer outputs; the
//! transport that carries them is not modeled here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::timestamp::Timestamp;

/// A message carrying its capture time.
pub trait Stamped {
    fn stamp(&self) -> Timestamp;
}

/// One head region with the faces found inside it.
///
/// `face_detections` are local to `head_detection`'s top-left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadDetection {
    pub head_detection: Region,
    #[serde(default)]
    pub face_detections: Vec<Region>,
}

impl HeadDetection {
    pub fn new(head_detection: Region, face_detections: Vec<Region>) -> Self {
        Self {
            head_detection,
            face_detections,
        }
    }

    /// Face boxes translated into frame coordinates.
    ///
    /// Crops share the frame's pixel scale, so composition is a translation.
    pub fn global_faces(&self) -> impl Iterator<Item = Region> + '_ {
        let (dx, dy) = (self.head_detection.x, self.head_detection.y);
        self.face_detections.iter().map(move |f| f.translated(dx, dy))
    }
}

/// All head detections of one detection cycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionArray {
    pub stamp: Timestamp,
    #[serde(default)]
    pub head_detections: Vec<HeadDetection>,
}

/// One recognized region in frame coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub roi: Region,
    /// Upstream stage that proposed the region, e.g. `"head"` or `"face"`.
    pub detector: String,
    /// Identity name, `"Unknown"`, or `"No face"`.
    pub label: String,
}

impl Recognition {
    pub fn new(roi: Region, detector: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            roi,
            detector: detector.into(),
            label: label.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionArray {
    pub stamp: Timestamp,
    #[serde(default)]
    pub detections: Vec<Recognition>,
}

/// Pixel layouts accepted on the image stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelEncoding {
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Mono8,
}

impl PixelEncoding {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rgb8" => Some(Self::Rgb8),
            "bgr8" => Some(Self::Bgr8),
            "rgba8" => Some(Self::Rgba8),
            "bgra8" => Some(Self::Bgra8),
            "mono8" => Some(Self::Mono8),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb8 => "rgb8",
            Self::Bgr8 => "bgr8",
            Self::Rgba8 => "rgba8",
            Self::Bgra8 => "bgra8",
            Self::Mono8 => "mono8",
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::Mono8 => 1,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }

    fn to_rgb(self, px: &[u8]) -> [u8; 3] {
        match self {
            Self::Rgb8 | Self::Rgba8 => [px[0], px[1], px[2]],
            Self::Bgr8 | Self::Bgra8 => [px[2], px[1], px[0]],
            Self::Mono8 => [px[0]; 3],
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot decode {encoding} image: {reason}")]
pub struct DecodeError {
    pub encoding: String,
    pub reason: String,
}

impl DecodeError {
    fn new(encoding: &str, reason: impl Into<String>) -> Self {
        Self {
            encoding: encoding.to_string(),
            reason: reason.into(),
        }
    }
}

/// Raw color image as it arrives on the wire.
///
/// `step` is the row stride in bytes and may exceed `width × channels`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageMessage {
    pub stamp: Timestamp,
    pub width: u32,
    pub height: u32,
    pub encoding: String,
    pub step: u32,
    pub data: Vec<u8>,
}

impl ImageMessage {
    /// Encodes a frame as `bgr8` (or `mono8` for single-channel frames).
    pub fn from_frame(frame: &Frame) -> Self {
        let (encoding, data) = if frame.channels() == 1 {
            (PixelEncoding::Mono8, frame.data().to_vec())
        } else {
            let channels = frame.channels() as usize;
            let data = frame
                .data()
                .chunks_exact(channels)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect();
            (PixelEncoding::Bgr8, data)
        };
        Self {
            stamp: frame.stamp(),
            width: frame.width(),
            height: frame.height(),
            encoding: encoding.as_str().to_string(),
            step: frame.width() * encoding.channels() as u32,
            data,
        }
    }

    /// Decodes into an RGB frame, the only layout the annotator draws on.
    pub fn to_frame(&self) -> Result<Frame, DecodeError> {
        let encoding = PixelEncoding::parse(&self.encoding)
            .ok_or_else(|| DecodeError::new(&self.encoding, "unsupported encoding"))?;
        if self.width == 0 || self.height == 0 {
            return Err(DecodeError::new(
                &self.encoding,
                format!("zero dimension {}x{}", self.width, self.height),
            ));
        }

        let channels = encoding.channels();
        let row_len = self.width as usize * channels;
        let step = self.step as usize;
        if step < row_len {
            return Err(DecodeError::new(
                &self.encoding,
                format!("row step {step} shorter than {row_len} bytes"),
            ));
        }
        let needed = step * (self.height as usize - 1) + row_len;
        if self.data.len() < needed {
            return Err(DecodeError::new(
                &self.encoding,
                format!("buffer holds {} bytes, need {needed}", self.data.len()),
            ));
        }

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in 0..self.height as usize {
            let start = row * step;
            for px in self.data[start..start + row_len].chunks_exact(channels) {
                rgb.extend_from_slice(&encoding.to_rgb(px));
            }
        }
        Ok(Frame::new(rgb, self.width, self.height, 3, self.stamp))
    }
}

/// A head region together with its pixels, as sent by the head detector.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadCrop {
    pub head_detection: Region,
    pub color_image: ImageMessage,
}

/// Every head crop of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadCropArray {
    pub stamp: Timestamp,
    pub heads: Vec<HeadCrop>,
}

impl Stamped for DetectionArray {
    fn stamp(&self) -> Timestamp {
        self.stamp
    }
}

impl Stamped for RecognitionArray {
    fn stamp(&self) -> Timestamp {
        self.stamp
    }
}

impl Stamped for ImageMessage {
    fn stamp(&self) -> Timestamp {
        self.stamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn image(encoding: &str, width: u32, height: u32, step: u32, data: Vec<u8>) -> ImageMessage {
        ImageMessage {
            stamp: Timestamp::from_secs_f64(1.0),
            width,
            height,
            encoding: encoding.to_string(),
            step,
            data,
        }
    }

    #[test]
    fn test_global_faces_translate_by_head_origin() {
        let head = HeadDetection::new(Region::new(10, 20, 50, 50), vec![Region::new(5, 5, 20, 20)]);
        let global: Vec<Region> = head.global_faces().collect();
        assert_eq!(global, vec![Region::new(15, 25, 20, 20)]);
    }

    #[test]
    fn test_global_faces_empty_without_faces() {
        let head = HeadDetection::new(Region::new(10, 20, 50, 50), Vec::new());
        assert_eq!(head.global_faces().count(), 0);
    }

    #[test]
    fn test_detection_array_json_defaults_missing_faces() {
        let json = r#"{"stamp": 0.5, "head_detections": [
            {"head_detection": {"x": 1, "y": 2, "width": 3, "height": 4}}]}"#;
        let parsed: DetectionArray = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.stamp(), Timestamp::from_secs_f64(0.5));
        assert!(parsed.head_detections[0].face_detections.is_empty());
    }

    #[test]
    fn test_recognition_array_from_json() {
        let json = r#"{"stamp": 2.0, "detections": [
            {"roi": {"x": 1, "y": 2, "width": 3, "height": 4}, "detector": "head", "label": "Unknown"}]}"#;
        let parsed: RecognitionArray = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.detections[0], Recognition::new(Region::new(1, 2, 3, 4), "head", "Unknown"));
    }

    #[rstest]
    #[case::rgb("rgb8", vec![1, 2, 3], [1, 2, 3])]
    #[case::bgr("bgr8", vec![3, 2, 1], [1, 2, 3])]
    #[case::rgba("rgba8", vec![1, 2, 3, 9], [1, 2, 3])]
    #[case::bgra("bgra8", vec![3, 2, 1, 9], [1, 2, 3])]
    #[case::mono("mono8", vec![7], [7, 7, 7])]
    fn test_decode_single_pixel(#[case] encoding: &str, #[case] data: Vec<u8>, #[case] expected: [u8; 3]) {
        let step = data.len() as u32;
        let frame = image(encoding, 1, 1, step, data).to_frame().unwrap();
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data(), &expected[..]);
        assert_eq!(frame.stamp(), Timestamp::from_secs_f64(1.0));
    }

    #[test]
    fn test_decode_skips_row_padding() {
        // 1x2 rgb8 with 2 padding bytes per row
        let data = vec![1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        let frame = image("rgb8", 1, 2, 5, data).to_frame().unwrap();
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[rstest]
    #[case::unknown_encoding(image("yuv422", 1, 1, 2, vec![0, 0]))]
    #[case::zero_width(image("rgb8", 0, 1, 0, vec![]))]
    #[case::short_step(image("rgb8", 2, 1, 3, vec![0; 6]))]
    #[case::short_buffer(image("bgr8", 2, 2, 6, vec![0; 8]))]
    fn test_decode_errors(#[case] msg: ImageMessage) {
        assert!(msg.to_frame().is_err());
    }

    #[test]
    fn test_from_frame_encodes_bgr8_and_roundtrips() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, Timestamp::from_secs_f64(3.0));
        let msg = ImageMessage::from_frame(&frame);
        assert_eq!(msg.encoding, "bgr8");
        assert_eq!(msg.step, 6);
        assert_eq!(msg.data, vec![30, 20, 10, 60, 50, 40]);
        assert_eq!(msg.to_frame().unwrap(), frame);
    }
}
