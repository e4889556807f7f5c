//! Colors and captions for annotated frames.
//!
//! All colors are RGB.

use crate::fusion::domain::messages::Recognition;
use crate::shared::constants::{HEAD_DETECTOR_TAG, NO_FACE_LABEL, UNKNOWN_LABEL};
use crate::shared::region::Region;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

/// Head detection boxes.
pub const HEAD_BOX_COLOR: Color = Color::rgb(148, 219, 255);
/// Face boxes from the detection stream.
pub const FACE_BOX_COLOR: Color = Color::rgb(191, 255, 148);
/// Recognition boxes proposed by the head detector.
pub const HEAD_RECOGNITION_COLOR: Color = Color::rgb(0, 0, 255);
/// Recognition boxes from any other detector.
pub const FACE_RECOGNITION_COLOR: Color = Color::rgb(0, 255, 0);
/// Captions for unidentified regions.
pub const ALERT_CAPTION_COLOR: Color = Color::rgb(255, 0, 0);
/// Captions carrying an identity.
pub const IDENTITY_CAPTION_COLOR: Color = Color::rgb(0, 255, 0);

pub const BOX_THICKNESS: i32 = 2;
/// Caption baseline sits this far below the bottom edge of its box.
pub const CAPTION_OFFSET_Y: i32 = 25;

/// Outline corners are never placed further than this outside the frame.
const OUTLINE_MARGIN: i64 = BOX_THICKNESS as i64 + 1;

/// What the recognizer concluded about one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecognitionOutcome<'a> {
    Unknown,
    NoFace,
    Identified(&'a str),
}

impl<'a> RecognitionOutcome<'a> {
    pub fn from_label(label: &'a str) -> Self {
        match label {
            UNKNOWN_LABEL => Self::Unknown,
            NO_FACE_LABEL => Self::NoFace,
            name => Self::Identified(name),
        }
    }

    pub fn caption(&self) -> &'a str {
        match self {
            Self::Unknown => UNKNOWN_LABEL,
            Self::NoFace => NO_FACE_LABEL,
            Self::Identified(name) => name,
        }
    }

    pub fn caption_color(&self) -> Color {
        match self {
            Self::Unknown | Self::NoFace => ALERT_CAPTION_COLOR,
            Self::Identified(_) => IDENTITY_CAPTION_COLOR,
        }
    }
}

/// Fully resolved drawing instructions for one recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecognitionStyle<'a> {
    pub box_color: Color,
    pub caption: &'a str,
    pub caption_color: Color,
    /// Left end of the caption baseline, in frame coordinates. Wide enough
    /// that boxes at the edge of the `i32` range cannot overflow it.
    pub caption_origin: (i64, i64),
}

pub fn resolve_style(recognition: &Recognition) -> RecognitionStyle<'_> {
    let outcome = RecognitionOutcome::from_label(&recognition.label);
    let box_color = if recognition.detector == HEAD_DETECTOR_TAG {
        HEAD_RECOGNITION_COLOR
    } else {
        FACE_RECOGNITION_COLOR
    };
    let roi = recognition.roi;
    RecognitionStyle {
        box_color,
        caption: outcome.caption(),
        caption_color: outcome.caption_color(),
        caption_origin: (
            roi.x as i64,
            roi.y as i64 + roi.height as i64 + CAPTION_OFFSET_Y as i64,
        ),
    }
}

/// Corners `(x, y)` and `(x + w, y + h)` of a box outline drawn on a
/// `width × height` frame.
///
/// Corners far outside the frame are pulled in to just past its border, so
/// the visible part of the outline is unchanged while the rasterizer only
/// ever sees small coordinates. Returns `None` when no part of the outline
/// can land on the frame.
pub fn outline_corners(region: Region, width: u32, height: u32) -> Option<[(i32, i32); 2]> {
    let (x1, x2) = ordered(region.x as i64, region.x as i64 + region.width as i64);
    let (y1, y2) = ordered(region.y as i64, region.y as i64 + region.height as i64);
    let (w, h, m) = (width as i64, height as i64, OUTLINE_MARGIN);

    let misses = x2 < -m || y2 < -m || x1 > w + m || y1 > h + m;
    let encloses = x1 < -m && y1 < -m && x2 > w + m && y2 > h + m;
    if misses || encloses {
        return None;
    }

    let cx = |v: i64| v.clamp(-m, w + m) as i32;
    let cy = |v: i64| v.clamp(-m, h + m) as i32;
    Some([(cx(x1), cy(y1)), (cx(x2), cy(y2))])
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    (a.min(b), a.max(b))
}
