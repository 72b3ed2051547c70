//! The frozen end-of-session snapshot and its summary.

use crate::constants::SUMMARY_DATE_FORMAT;
use crate::geometry::Rect;
use crate::landmarks::FaceReading;
use crate::overlay::OverlayCompositor;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use image::{imageops, ImageFormat, RgbaImage};
use log::info;
use std::path::Path;

/// Last live frame plus glasses, rendered at native capture size
#[derive(Debug, Clone)]
pub struct FrozenComposite {
    image: RgbaImage,
    captured_at: DateTime<Local>,
}

impl FrozenComposite {
    /// Render the snapshot into an offscreen canvas of `capture_size`.
    ///
    /// `reading` is in the frame's own pixel space. Without one the snapshot
    /// is the bare frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture size is zero or the overlay cannot be placed
    pub fn capture(
        frame: &RgbaImage,
        reading: Option<&FaceReading>,
        glasses: &RgbaImage,
        compositor: &OverlayCompositor,
        capture_size: (u32, u32),
        captured_at: DateTime<Local>,
    ) -> Result<Self> {
        let (width, height) = capture_size;
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput("Capture size must be non-zero".to_string()));
        }

        let mut image = if frame.dimensions() == capture_size {
            frame.clone()
        } else {
            imageops::resize(frame, width, height, imageops::FilterType::Triangle)
        };

        let src = Rect::from_size(frame.width(), frame.height());
        let dst = Rect::from_size(width, height);
        if let Some(placement) = compositor.placement(reading, glasses.dimensions()) {
            compositor.draw(&mut image, glasses, &placement.mapped(&src, &dst))?;
        }

        info!("Snapshot captured at {}x{}", width, height);
        Ok(Self { image, captured_at })
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// Write the snapshot as a PNG file
    ///
    /// # Errors
    ///
    /// Returns `Export` if the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| Error::Export(format!("{}: {e}", path.display())))?;
        info!("Snapshot saved to {}", path.display());
        Ok(())
    }
}

/// What the end-of-session panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Finish date in short es-ES style
    pub date: String,
    pub duration_secs: u32,
}

impl SessionSummary {
    #[must_use]
    pub fn new(finished_at: DateTime<Local>, duration_secs: u32) -> Self {
        Self {
            date: finished_at.format(SUMMARY_DATE_FORMAT).to_string(),
            duration_secs,
        }
    }

    /// Date line as displayed
    #[must_use]
    pub fn date_text(&self) -> String {
        format!("Date: {}", self.date)
    }
}
