//! Safe casting utilities for turning float geometry into pixel units

use crate::{Error, Result};

/// Convert a float extent into a pixel dimension, rounding to nearest
///
/// # Errors
///
/// Returns an error if the value is not finite, rounds below 1 or exceeds u32::MAX
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Checked before casting
pub fn f32_to_dimension(value: f32) -> Result<u32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= 1.0 && f64::from(rounded) <= f64::from(u32::MAX) {
        Ok(rounded as u32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} is not a usable pixel dimension"
        )))
    }
}

/// Convert a float coordinate into an `i64` pixel offset, rounding to nearest
///
/// # Errors
///
/// Returns an error if the value is not finite
#[allow(clippy::cast_possible_truncation)] // f32 magnitude fits in i64 once finite
pub fn f32_to_offset(value: f32) -> Result<i64> {
    if value.is_finite() {
        Ok(value.round() as i64)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be used as a pixel offset"
        )))
    }
}

/// Clamp and convert f32 to i32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.round().clamp(min as f32, max as f32);
    (clamped as i32).clamp(min, max)
}
