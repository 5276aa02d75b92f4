//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they validate
//! dimensions up front, then hand the pixel work to the backend.

use super::backend::{BackendError, RasterBackend};
use super::calculations::{effective_dimensions, resampled_height};
use super::params::{CropSpec, OutputFormat, Quality};
use image::RgbaImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Produce the effective image: `source` with `crop` applied.
///
/// Fails with [`BackendError::InvalidCrop`] before touching any pixels when
/// the result would have a non-positive side.
pub fn crop_pad(backend: &impl RasterBackend, source: &RgbaImage, crop: CropSpec) -> Result<RgbaImage> {
    effective_dimensions(source.dimensions(), crop)
        .map_err(|(width, height)| BackendError::InvalidCrop { width, height })?;
    if crop.is_identity() {
        return Ok(source.clone());
    }
    backend.crop_pad(source, crop)
}

/// Rescale an effective image to `target_width`, preserving aspect ratio.
pub fn resample_to_width(
    backend: &impl RasterBackend,
    image: &RgbaImage,
    target_width: u32,
) -> Result<RgbaImage> {
    let height = resampled_height(image.dimensions(), target_width);
    backend.resample(image, target_width, height)
}

/// Encode the horizontal band `[offset_y, offset_y + height)` of `composite`
/// at full width. Pixels are copied exactly; nothing is resampled.
pub fn encode_band(
    backend: &impl RasterBackend,
    composite: &RgbaImage,
    offset_y: u32,
    height: u32,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>> {
    let end = offset_y as u64 + height as u64;
    if end > composite.height() as u64 {
        return Err(BackendError::Encode(format!(
            "band {offset_y}..{end} lies outside a composite of height {}",
            composite.height()
        )));
    }
    let band = image::imageops::crop_imm(composite, 0, offset_y, composite.width(), height).to_image();
    backend.encode(&band, format, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::RustBackend;
    use crate::test_helpers::gradient;

    #[test]
    fn invalid_crop_never_reaches_backend() {
        let backend = MockBackend::new();
        let result = crop_pad(&backend, &RgbaImage::new(10, 10), CropSpec::new(0, 0, 10, 0));
        assert!(matches!(result, Err(BackendError::InvalidCrop { .. })));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn identity_crop_skips_backend() {
        let backend = MockBackend::new();
        let out = crop_pad(&backend, &RgbaImage::new(8, 4), CropSpec::default()).unwrap();
        assert_eq!(out.dimensions(), (8, 4));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn resample_uses_rounded_height() {
        let backend = MockBackend::new();
        let out = resample_to_width(&backend, &RgbaImage::new(150, 60), 200).unwrap();
        assert_eq!(out.dimensions(), (200, 80));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Resample {
                from: (150, 60),
                to: (200, 80)
            }]
        );
    }

    #[test]
    fn band_is_exact_copy() {
        let composite = gradient(9, 20);
        let backend = RustBackend::new();
        let bytes = encode_band(&backend, &composite, 5, 7, OutputFormat::Png, Quality::default())
            .unwrap();
        let band = backend.decode(&bytes).unwrap();
        assert_eq!(band.dimensions(), (9, 7));
        for y in 0..7 {
            for x in 0..9 {
                assert_eq!(band.get_pixel(x, y), composite.get_pixel(x, y + 5));
            }
        }
    }

    #[test]
    fn band_past_bottom_errors() {
        let backend = MockBackend::new();
        let result = encode_band(
            &backend,
            &RgbaImage::new(4, 10),
            8,
            3,
            OutputFormat::Png,
            Quality::default(),
        );
        assert!(matches!(result, Err(BackendError::Encode(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn band_passes_format_and_quality() {
        let backend = MockBackend::new();
        encode_band(
            &backend,
            &RgbaImage::new(4, 10),
            0,
            10,
            OutputFormat::Jpeg,
            Quality::new(0.5),
        )
        .unwrap();
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Encode {
                width: 4,
                height: 10,
                format: OutputFormat::Jpeg,
                quality: 50
            }]
        );
    }
}
