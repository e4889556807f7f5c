use image::RgbImage;
use opencv::core::{self as cv, Mat, CV_8U};
use opencv::prelude::*;

use crate::shared::timestamp::Timestamp;

/// A single color or grayscale image: contiguous bytes in row-major order.
///
/// Color frames are RGB. Conversion from wire encodings (BGR, RGBA, ...)
/// happens at the message boundary only; the domain layer treats pixel data
/// as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    stamp: Timestamp,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, stamp: Timestamp) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            stamp,
        }
    }

    pub fn from_rgb_image(image: RgbImage, stamp: Timestamp) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, stamp)
    }

    /// Copies an 8-bit OpenCV matrix, keeping its channel order.
    pub fn from_mat(mat: &Mat, stamp: Timestamp) -> opencv::Result<Self> {
        if mat.depth() != CV_8U {
            return Err(opencv::Error::new(
                cv::StsUnsupportedFormat,
                format!("expected 8-bit pixels, got depth {}", mat.depth()),
            ));
        }
        let data = if mat.is_continuous() {
            mat.data_bytes()?.to_vec()
        } else {
            mat.try_clone()?.data_bytes()?.to_vec()
        };
        Ok(Self::new(
            data,
            mat.cols() as u32,
            mat.rows() as u32,
            mat.channels() as u8,
            stamp,
        ))
    }

    /// Copies the pixels into an owned `rows × cols` matrix with one
    /// channel per frame channel.
    pub fn to_mat(&self) -> opencv::Result<Mat> {
        let flat = Mat::from_slice(self.data.as_slice())?;
        let shaped = flat.reshape(self.channels as i32, self.height as i32)?;
        shaped.try_clone()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn stamp(&self) -> Timestamp {
        self.stamp
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
