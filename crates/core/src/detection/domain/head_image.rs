use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// A head-sized crop of a color frame, searched for faces in isolation.
///
/// `bounds` records where the crop sits in the source frame; faces found in
/// `pixels` are local to the crop's own top-left corner.
#[derive(Clone, Debug)]
pub struct HeadImage {
    bounds: Region,
    pixels: Frame,
}

impl HeadImage {
    pub fn new(bounds: Region, pixels: Frame) -> Self {
        Self { bounds, pixels }
    }

    /// Cuts `bounds` out of `frame`, trimming it to the frame first.
    ///
    /// Returns `None` when the bounds do not overlap the frame at all.
    pub fn crop(frame: &Frame, bounds: Region) -> Option<HeadImage> {
        let visible = bounds.clamp_to(frame.width(), frame.height())?;
        let channels = frame.channels() as usize;
        let stride = frame.width() as usize * channels;
        let row_len = visible.width as usize * channels;

        let mut data = Vec::with_capacity(row_len * visible.height as usize);
        for row in visible.y..visible.bottom() {
            let start = row as usize * stride + visible.x as usize * channels;
            data.extend_from_slice(&frame.data()[start..start + row_len]);
        }

        let pixels = Frame::new(
            data,
            visible.width as u32,
            visible.height as u32,
            frame.channels(),
            frame.stamp(),
        );
        Some(HeadImage::new(visible, pixels))
    }

    pub fn bounds(&self) -> Region {
        self.bounds
    }

    pub fn pixels(&self) -> &Frame {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}
