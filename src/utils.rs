//! Utility helpers for pixel geometry and frame conversion.

pub mod safe_cast;

#[cfg(feature = "camera")]
pub mod image_conversion;
