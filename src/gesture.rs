//! Mouth-open gesture detection.
//!
//! The decision is a single threshold on the gap between the inner lips,
//! measured in display pixels. The state is sticky: a frame without a face
//! keeps whatever was decided last.

use crate::constants::DEFAULT_MOUTH_OPEN_THRESHOLD;
use crate::landmarks::FaceReading;

/// Mouth-open detector with sticky state across missed detections
#[derive(Debug, Clone)]
pub struct MouthGestureDetector {
    threshold: f32,
    mouth_open: bool,
    last_separation: Option<f32>,
}

impl MouthGestureDetector {
    /// Create a detector. The mouth counts as open when the separation is
    /// strictly greater than `threshold`.
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            mouth_open: false,
            last_separation: None,
        }
    }

    /// Update with this frame's display-space reading, if any
    pub fn update(&mut self, reading: Option<&FaceReading>) -> bool {
        if let Some(reading) = reading {
            let separation = reading.mouth_separation();
            self.last_separation = Some(separation);
            self.mouth_open = separation > self.threshold;
        }
        self.mouth_open
    }

    /// Current decision
    #[must_use]
    pub fn is_mouth_open(&self) -> bool {
        self.mouth_open
    }

    /// Separation measured on the most recent reading
    #[must_use]
    pub fn last_separation(&self) -> Option<f32> {
        self.last_separation
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Forget the current decision
    pub fn reset(&mut self) {
        self.mouth_open = false;
        self.last_separation = None;
    }
}

impl Default for MouthGestureDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MOUTH_OPEN_THRESHOLD)
    }
}
