//! Coordinate mapping between video space and canvas space.
//!
//! Landmarks arrive in video pixel space. Everything that gets drawn lives
//! either on the display canvas (where the video occupies a centered
//! rectangle) or on the offscreen capture canvas (native video size). Both
//! are reached with the same per-axis linear map.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(&self, other: &Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Midpoint between this point and another
    #[must_use]
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Both coordinates are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 2]> for Point {
    fn from(p: [f32; 2]) -> Self {
        Point::new(p[0], p[1])
    }
}

/// Axis-aligned rectangle given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin with the given image size
    #[allow(clippy::cast_precision_loss)] // Image dimensions are far below 2^24
    #[must_use]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Corners in the order top-left, top-right, bottom-left, bottom-right
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.x, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }
}

/// Map a point from the `src` rectangle into the `dst` rectangle.
///
/// Scaling is linear and independent per axis. Points outside `src` map to
/// points outside `dst`; nothing is clamped. A degenerate source axis
/// (zero extent) collapses onto the destination origin for that axis.
#[must_use]
pub fn map_point(p: Point, src: &Rect, dst: &Rect) -> Point {
    Point::new(
        map_axis(p.x, src.x, src.width, dst.x, dst.width),
        map_axis(p.y, src.y, src.height, dst.y, dst.height),
    )
}

#[allow(clippy::cast_possible_truncation)] // Result is a pixel coordinate
fn map_axis(v: f32, src_start: f32, src_len: f32, dst_start: f32, dst_len: f32) -> f32 {
    if src_len == 0.0 {
        return dst_start;
    }
    let t = (f64::from(v) - f64::from(src_start)) / f64::from(src_len);
    (f64::from(dst_start) + t * f64::from(dst_len)) as f32
}

/// Horizontal and vertical scale factors from `src` to `dst`
#[must_use]
pub fn scale_factors(src: &Rect, dst: &Rect) -> (f32, f32) {
    let sx = if src.width == 0.0 { 0.0 } else { dst.width / src.width };
    let sy = if src.height == 0.0 { 0.0 } else { dst.height / src.height };
    (sx, sy)
}

/// Where the video sits on the display canvas: horizontally centered, at a
/// fixed distance from the top, at native video size.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn video_placement(canvas_width: u32, video_width: u32, video_height: u32, top_offset: f32) -> Rect {
    Rect::new(
        (canvas_width as f32 - video_width as f32) / 2.0,
        top_offset,
        video_width as f32,
        video_height as f32,
    )
}
