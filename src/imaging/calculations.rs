//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropSpec;

/// Dimensions of an image after applying a crop/pad.
///
/// Returns the signed result as `Err((width, height))` when either side would be
/// zero or negative, so callers can report what the crop produced.
///
/// # Examples
/// ```
/// # use slicestream::imaging::{CropSpec, effective_dimensions};
/// // Crop 10px off the left, pad 5px on the right
/// assert_eq!(effective_dimensions((100, 50), CropSpec::new(0, 0, 10, -5)), Ok((95, 50)));
///
/// // Cropping away everything is invalid
/// assert!(effective_dimensions((100, 50), CropSpec::new(25, 25, 0, 0)).is_err());
/// ```
pub fn effective_dimensions(
    original: (u32, u32),
    crop: CropSpec,
) -> Result<(u32, u32), (i64, i64)> {
    let (w, h) = original;
    let new_w = w as i64 - crop.left as i64 - crop.right as i64;
    let new_h = h as i64 - crop.top as i64 - crop.bottom as i64;

    if new_w <= 0 || new_h <= 0 || new_w > u32::MAX as i64 || new_h > u32::MAX as i64 {
        return Err((new_w, new_h));
    }
    Ok((new_w as u32, new_h as u32))
}

/// Height of an image rescaled to `target_width`, preserving aspect ratio.
///
/// Rounds half away from zero, once per image. Errors are never redistributed
/// across images.
///
/// # Examples
/// ```
/// # use slicestream::imaging::resampled_height;
/// assert_eq!(resampled_height((100, 50), 200), 100);
/// assert_eq!(resampled_height((150, 60), 200), 80);
/// ```
pub fn resampled_height(effective: (u32, u32), target_width: u32) -> u32 {
    let (w, h) = effective;
    if w == target_width {
        return h;
    }
    (h as f64 * target_width as f64 / w as f64).round() as u32
}

/// Pick the common width for a stitch.
///
/// An explicit positive width wins; otherwise the widest effective image.
/// Returns `None` only when there is nothing to measure.
pub fn common_width(explicit: Option<u32>, widths: impl IntoIterator<Item = u32>) -> Option<u32> {
    match explicit {
        Some(w) if w > 0 => Some(w),
        _ => widths.into_iter().max(),
    }
}

/// Number of pixels in a `width × height` raster, without overflow.
pub fn pixel_count(width: u32, height: u32) -> u64 {
    width as u64 * height as u64
}
