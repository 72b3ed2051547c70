//! Landmark adapters: normalize backend-specific landmark sets into a
//! [`FaceReading`].
//!
//! Each supported tracker numbers its points differently. The adapter is the
//! only place that knows those indices; everything downstream works with the
//! four canonical points plus the mouth contour used for particle emission.

use crate::constants::{NUM_CLM_LANDMARKS, NUM_IBUG_LANDMARKS};
use crate::geometry::{map_point, Point, Rect};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// How mouth separation is measured for a given scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationMetric {
    /// `bottom.y - top.y`
    Vertical,
    /// Straight-line distance between the two points
    Euclidean,
}

impl SeparationMetric {
    /// Measure the gap between two mouth points
    #[must_use]
    pub fn measure(self, top: &Point, bottom: &Point) -> f32 {
        match self {
            SeparationMetric::Vertical => bottom.y - top.y,
            SeparationMetric::Euclidean => top.distance(bottom),
        }
    }
}

/// Per-frame bundle of the facial points the rest of the pipeline needs
#[derive(Debug, Clone, PartialEq)]
pub struct FaceReading {
    /// Inner upper lip
    pub mouth_top: Point,
    /// Inner lower lip
    pub mouth_bottom: Point,
    /// Outer corner of the left eye (image left)
    pub left_eye: Point,
    /// Outer corner of the right eye (image right)
    pub right_eye: Point,
    /// Mouth outline points particles are emitted from
    pub mouth_contour: Vec<Point>,
    /// Separation metric of the scheme that produced this reading
    pub metric: SeparationMetric,
}

impl FaceReading {
    /// Mouth opening measured with this reading's metric
    #[must_use]
    pub fn mouth_separation(&self) -> f32 {
        self.metric.measure(&self.mouth_top, &self.mouth_bottom)
    }

    /// The same reading with every point mapped from `src` into `dst`
    #[must_use]
    pub fn mapped(&self, src: &Rect, dst: &Rect) -> FaceReading {
        FaceReading {
            mouth_top: map_point(self.mouth_top, src, dst),
            mouth_bottom: map_point(self.mouth_bottom, src, dst),
            left_eye: map_point(self.left_eye, src, dst),
            right_eye: map_point(self.right_eye, src, dst),
            mouth_contour: self.mouth_contour.iter().map(|p| map_point(*p, src, dst)).collect(),
            metric: self.metric,
        }
    }
}

/// Landmark numbering scheme of a detection backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 68-point iBUG layout (face-api style trackers)
    Ibug68,
    /// 71-point clmtrackr layout
    Clm71,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ibug68 => write!(f, "ibug68"),
            BackendKind::Clm71 => write!(f, "clm71"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ibug68" | "ibug" | "faceapi" | "face-api" => Ok(BackendKind::Ibug68),
            "clm71" | "clm" | "clmtrackr" => Ok(BackendKind::Clm71),
            _ => Err(Error::InvalidInput(format!("Unknown backend kind: {s}"))),
        }
    }
}

/// Maps one backend's raw landmark list to a [`FaceReading`]
pub trait LandmarkAdapter: Send + Sync {
    /// Convert raw landmarks. Missing or non-finite points yield `None`.
    fn adapt(&self, raw: &[Point]) -> Option<FaceReading>;

    /// Number of points the scheme produces
    fn landmark_count(&self) -> usize;

    /// Adapter name
    fn name(&self) -> &str;
}

/// Index table shared by the concrete adapters
struct SchemeLayout {
    count: usize,
    mouth_top: usize,
    mouth_bottom: usize,
    left_eye: usize,
    right_eye: usize,
    contour: RangeInclusive<usize>,
    metric: SeparationMetric,
}

impl SchemeLayout {
    fn adapt(&self, raw: &[Point]) -> Option<FaceReading> {
        if raw.len() < self.count {
            log::debug!("Landmark set too short: {} < {}", raw.len(), self.count);
            return None;
        }
        if !raw[..self.count].iter().all(Point::is_finite) {
            log::debug!("Landmark set contains non-finite coordinates");
            return None;
        }

        Some(FaceReading {
            mouth_top: raw[self.mouth_top],
            mouth_bottom: raw[self.mouth_bottom],
            left_eye: raw[self.left_eye],
            right_eye: raw[self.right_eye],
            mouth_contour: raw[self.contour.clone()].to_vec(),
            metric: self.metric,
        })
    }
}

/// 68-point iBUG layout.
///
/// Outer lip 48-59, inner lip 60-67, right-side eye 36-41, left-side eye
/// 42-47. The gap is measured vertically between inner lip points 61 and 67.
pub struct Ibug68Adapter {
    layout: SchemeLayout,
}

impl Ibug68Adapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: SchemeLayout {
                count: NUM_IBUG_LANDMARKS,
                mouth_top: 61,
                mouth_bottom: 67,
                left_eye: 36,
                right_eye: 45,
                contour: 48..=59,
                metric: SeparationMetric::Vertical,
            },
        }
    }
}

impl Default for Ibug68Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkAdapter for Ibug68Adapter {
    fn adapt(&self, raw: &[Point]) -> Option<FaceReading> {
        self.layout.adapt(raw)
    }

    fn landmark_count(&self) -> usize {
        self.layout.count
    }

    fn name(&self) -> &str {
        "Ibug68Adapter"
    }
}

/// 71-point clmtrackr layout.
///
/// Lips occupy 44-61; 60 sits on the upper lip and 57 on the lower lip and
/// the gap between them is Euclidean. Outer eye corners are 27 and 32.
pub struct Clm71Adapter {
    layout: SchemeLayout,
}

impl Clm71Adapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: SchemeLayout {
                count: NUM_CLM_LANDMARKS,
                mouth_top: 60,
                mouth_bottom: 57,
                left_eye: 27,
                right_eye: 32,
                contour: 44..=61,
                metric: SeparationMetric::Euclidean,
            },
        }
    }
}

impl Default for Clm71Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkAdapter for Clm71Adapter {
    fn adapt(&self, raw: &[Point]) -> Option<FaceReading> {
        self.layout.adapt(raw)
    }

    fn landmark_count(&self) -> usize {
        self.layout.count
    }

    fn name(&self) -> &str {
        "Clm71Adapter"
    }
}

/// Create the adapter for a backend's landmark scheme
#[must_use]
pub fn create_adapter(kind: BackendKind) -> Box<dyn LandmarkAdapter> {
    match kind {
        BackendKind::Ibug68 => Box::new(Ibug68Adapter::new()),
        BackendKind::Clm71 => Box::new(Clm71Adapter::new()),
    }
}
