//! Pure Rust raster backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP, TIFF, GIF, BMP) | `image::load_from_memory` |
//! | Allocate | fallible `Vec::try_reserve_exact`, capped by `max_pixels` |
//! | Crop / pad | white canvas + `image::imageops::overlay` at `(-left, -top)` |
//! | Resample | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (RGBA8) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB8, quality 1-100) |

use super::backend::{BackendError, RasterBackend};
use super::calculations::{effective_dimensions, pixel_count};
use super::params::{CropSpec, OutputFormat, Quality};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage, RgbaImage};
use std::sync::LazyLock;

/// Largest raster the backend will allocate, in pixels.
///
/// Matches the canvas area limit of mainstream browsers (16384 × 16384).
pub const DEFAULT_MAX_PIXELS: u64 = 268_435_456;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend {
    max_pixels: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    /// Cap raster allocations at `max_pixels`.
    pub fn with_max_pixels(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// Allocate a raster filled with opaque white, failing instead of aborting
    /// when the buffer is too large.
    fn white_canvas(&self, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        let context_error = || BackendError::RasterContext { width, height };

        if pixel_count(width, height) > self.max_pixels {
            return Err(context_error());
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(context_error)?;

        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| context_error())?;
        buf.resize(len, u8::MAX);

        RgbaImage::from_raw(width, height, buf).ok_or_else(context_error)
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        let img = image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        if pixel_count(img.width(), img.height()) > self.max_pixels {
            return Err(BackendError::RasterContext {
                width: img.width(),
                height: img.height(),
            });
        }
        Ok(img.into_rgba8())
    }

    fn allocate(&self, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        self.white_canvas(width, height)
    }

    fn crop_pad(&self, source: &RgbaImage, crop: CropSpec) -> Result<RgbaImage, BackendError> {
        let (width, height) = effective_dimensions(source.dimensions(), crop)
            .map_err(|(width, height)| BackendError::InvalidCrop { width, height })?;

        let mut canvas = self.white_canvas(width, height)?;
        // Alpha-blends onto the white fill; pixels outside the canvas are clipped.
        image::imageops::overlay(&mut canvas, source, -(crop.left as i64), -(crop.top as i64));
        Ok(canvas)
    }

    fn resample(
        &self,
        image: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError> {
        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }
        if pixel_count(width, height) > self.max_pixels {
            return Err(BackendError::RasterContext { width, height });
        }
        if width == 0 || height == 0 {
            return Ok(RgbaImage::new(width, height));
        }
        Ok(image::imageops::resize(
            image,
            width,
            height,
            FilterType::Lanczos3,
        ))
    }

    fn encode(
        &self,
        image: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(BackendError::Encode(format!(
                "cannot encode an empty {width}x{height} raster"
            )));
        }

        let mut buf = Vec::new();
        match format {
            OutputFormat::Png => PngEncoder::new(&mut buf)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?,
            OutputFormat::Jpeg => {
                let rgb: RgbImage = image.convert();
                JpegEncoder::new_with_quality(&mut buf, quality.percent())
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?
            }
        }
        Ok(buf)
    }
}
