use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle.
///
/// Whether it is expressed in head-local or frame-global coordinates depends
/// on the pipeline stage that produced it; composing the two is a pure
/// translation (see [`Region::translated`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Same size, origin shifted by `(dx, dy)`. Saturates instead of
    /// wrapping for boxes at the edge of the coordinate range.
    pub fn translated(&self, dx: i32, dy: i32) -> Region {
        Region {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            width: self.width,
            height: self.height,
        }
    }

    /// Intersects the region with a `width × height` image.
    ///
    /// Returns `None` when nothing of the region remains visible.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let x1 = (self.x as i64).max(0);
        let y1 = (self.y as i64).max(0);
        let x2 = (self.x as i64 + self.width as i64).min(width as i64);
        let y2 = (self.y as i64 + self.height as i64).min(height as i64);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        // all four values lie in 0..=width or 0..=height and fit i32 here
        Some(Region::new(x1 as i32, y1 as i32, (x2 - x1) as i32, (y2 - y1) as i32))
    }
}
