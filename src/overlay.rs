//! Glasses overlay placement and drawing.

use crate::constants::DEFAULT_GLASSES_SCALE;
use crate::geometry::{map_point, scale_factors, Point, Rect};
use crate::landmarks::FaceReading;
use crate::utils::safe_cast::{f32_to_dimension, f32_to_offset};
use crate::Result;
use image::{imageops, RgbaImage};

/// Where and how big the glasses are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    /// Center of the glasses image
    pub center: Point,
    pub width: f32,
    pub height: f32,
}

impl OverlayPlacement {
    /// Move the placement from `src` space into `dst` space
    #[must_use]
    pub fn mapped(&self, src: &Rect, dst: &Rect) -> OverlayPlacement {
        let (sx, sy) = scale_factors(src, dst);
        OverlayPlacement {
            center: map_point(self.center, src, dst),
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// Top-left corner of the drawn image
    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.center.x - self.width / 2.0, self.center.y - self.height / 2.0)
    }
}

/// Positions a glasses image from the outer eye corners
#[derive(Debug, Clone, Copy)]
pub struct OverlayCompositor {
    scale: f32,
}

impl OverlayCompositor {
    #[must_use]
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Placement in the reading's own (video) space.
    ///
    /// `image_size` is the native (width, height) of the glasses image. No
    /// reading means nothing is drawn this frame.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn placement(&self, reading: Option<&FaceReading>, image_size: (u32, u32)) -> Option<OverlayPlacement> {
        let reading = reading?;
        let (img_w, img_h) = image_size;
        if img_w == 0 {
            return None;
        }

        let center = reading.left_eye.midpoint(&reading.right_eye);
        let width = reading.left_eye.distance(&reading.right_eye) * self.scale;
        let height = width * (img_h as f32 / img_w as f32);

        Some(OverlayPlacement { center, width, height })
    }

    /// Draw `glasses` onto `canvas` at `placement` (already in canvas space).
    ///
    /// Returns `false` when the placement is too small to draw.
    ///
    /// # Errors
    ///
    /// Returns an error if the placement contains non-finite coordinates
    pub fn draw(&self, canvas: &mut RgbaImage, glasses: &RgbaImage, placement: &OverlayPlacement) -> Result<bool> {
        let (Ok(width), Ok(height)) = (f32_to_dimension(placement.width), f32_to_dimension(placement.height)) else {
            log::debug!("Skipping overlay smaller than a pixel: {placement:?}");
            return Ok(false);
        };

        let top_left = placement.top_left();
        let x = f32_to_offset(top_left.x)?;
        let y = f32_to_offset(top_left.y)?;

        let resized = imageops::resize(glasses, width, height, imageops::FilterType::Triangle);
        imageops::overlay(canvas, &resized, x, y);
        Ok(true)
    }
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_GLASSES_SCALE)
    }
}
