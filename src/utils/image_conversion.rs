//! Conversion between OpenCV `Mat` frames and `image` buffers.

use crate::{Error, Result};
use image::RgbaImage;
use opencv::core::{Mat, Scalar, CV_8UC4};
use opencv::imgproc::{self, COLOR_BGR2RGBA, COLOR_RGBA2BGR};
use opencv::prelude::*;

/// Convert a BGR camera frame into an RGBA image
///
/// # Errors
///
/// Returns an error if the Mat is empty or the color conversion fails
#[allow(clippy::cast_sign_loss)] // Dimensions checked positive
pub fn bgr_mat_to_rgba(mat: &Mat) -> Result<RgbaImage> {
    let rows = mat.rows();
    let cols = mat.cols();
    if rows <= 0 || cols <= 0 {
        return Err(Error::InvalidInput(format!("Invalid Mat dimensions: {cols}x{rows}")));
    }

    let mut rgba = Mat::default();
    imgproc::cvt_color(mat, &mut rgba, COLOR_BGR2RGBA, 0)?;

    let bytes = rgba.data_bytes()?.to_vec();
    RgbaImage::from_raw(cols as u32, rows as u32, bytes)
        .ok_or_else(|| Error::Capture("Frame buffer does not match its dimensions".to_string()))
}

/// Convert an RGBA image into a BGR Mat for display
///
/// # Errors
///
/// Returns an error if the image is too large for a Mat or conversion fails
pub fn rgba_to_bgr_mat(image: &RgbaImage) -> Result<Mat> {
    let rows = i32::try_from(image.height())
        .map_err(|_| Error::InvalidInput(format!("Image height {} too large", image.height())))?;
    let cols = i32::try_from(image.width())
        .map_err(|_| Error::InvalidInput(format!("Image width {} too large", image.width())))?;

    let mut rgba = Mat::new_rows_cols_with_default(rows, cols, CV_8UC4, Scalar::all(0.0))?;
    rgba.data_bytes_mut()?.copy_from_slice(image.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgba, &mut bgr, COLOR_RGBA2BGR, 0)?;
    Ok(bgr)
}
