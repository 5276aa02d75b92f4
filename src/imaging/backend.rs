//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait defines the pixel operations the pipeline
//! needs: decode, allocate, crop/pad, resample, and encode. Everything above
//! it (stitching, slicing, naming) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock.

use super::params::{CropSpec, OutputFormat, Quality};
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid crop: resulting size would be {width}x{height}")]
    InvalidCrop { width: i64, height: i64 },
    #[error("Cannot allocate a {width}x{height} raster")]
    RasterContext { width: u32, height: u32 },
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Trait for raster backends.
///
/// Implementations must be deterministic: the same inputs always produce the
/// same dimensions and pixels.
pub trait RasterBackend: Sync {
    /// Decode an encoded image (PNG, JPEG, ...) into RGBA pixels.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Allocate an opaque white canvas.
    fn allocate(&self, width: u32, height: u32) -> Result<RgbaImage, BackendError>;

    /// Apply a crop/pad, placing the source at `(-left, -top)` on a white canvas.
    fn crop_pad(&self, source: &RgbaImage, crop: CropSpec) -> Result<RgbaImage, BackendError>;

    /// Rescale to exactly `width × height`.
    fn resample(
        &self,
        image: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, BackendError>;

    /// Encode pixels in the requested format. `quality` only matters for lossy formats.
    fn encode(
        &self,
        image: &RgbaImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
