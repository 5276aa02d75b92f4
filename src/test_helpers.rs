//! Shared test utilities for the slicestream test suite.
//!
//! Synthetic rasters and sources so tests never touch the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let images = vec![source("a", 100, 50), source("b", 200, 80)];
//! let composite = stitch(&RustBackend::new(), &images, None).unwrap();
//! assert_eq!(placement_heights(&composite), vec![100, 80]);
//! ```

use image::{ImageEncoder, Rgba, RgbaImage};

use crate::imaging::CropSpec;
use crate::source::SourceImage;
use crate::stitch::Composite;

// =========================================================================
// Rasters
// =========================================================================

/// A raster filled with a single color.
pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// A raster whose pixels encode their own position, so offsets are checkable.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

/// Encode a raster as PNG bytes.
pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    buf
}

// =========================================================================
// Sources
// =========================================================================

/// A gradient source with no crop. The id doubles as the display name.
pub fn source(id: &str, width: u32, height: u32) -> SourceImage {
    SourceImage::new(id, id, gradient(width, height))
}

/// A solid-color source with the given crop.
pub fn cropped_source(id: &str, width: u32, height: u32, crop: CropSpec) -> SourceImage {
    SourceImage::new(id, id, solid(width, height, Rgba([0, 0, 255, 255]))).with_crop(crop)
}

// =========================================================================
// Composite extractors
// =========================================================================

/// Resampled heights in stitch order.
pub fn placement_heights(composite: &Composite) -> Vec<u32> {
    composite.placements.iter().map(|p| p.height).collect()
}

/// Y offsets in stitch order.
pub fn placement_offsets(composite: &Composite) -> Vec<u32> {
    composite.placements.iter().map(|p| p.offset_y).collect()
}

/// Image ids in stitch order.
pub fn placement_ids(composite: &Composite) -> Vec<&str> {
    composite
        .placements
        .iter()
        .map(|p| p.id.as_str())
        .collect()
}
