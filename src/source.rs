//! Source images: the ordered inputs to a stitch.
//!
//! A [`SourceImage`] owns its decoded pixels behind an `Arc`, so cloning a list
//! of sources is cheap. That clone is the snapshot a pipeline run works on:
//! later edits to the caller's list (reordering, new crops) never reach a run
//! already in flight.

use crate::imaging::{BackendError, CropSpec, RasterBackend};
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot read image '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: BackendError,
    },
}

/// One input image with its own crop/pad.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Stable identity, unique within a batch.
    pub id: String,
    /// Display name used in messages (file stem for files).
    pub name: String,
    pub crop: CropSpec,
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            crop: CropSpec::default(),
            pixels: Arc::new(pixels),
        }
    }

    /// Decode encoded bytes (PNG, JPEG, ...) into a source.
    pub fn decode(
        backend: &impl RasterBackend,
        id: impl Into<String>,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, SourceError> {
        let name = name.into();
        let pixels = backend.decode(bytes).map_err(|source| SourceError::Decode {
            name: name.clone(),
            source,
        })?;
        Ok(Self::new(id, name, pixels))
    }

    pub fn with_crop(mut self, crop: CropSpec) -> Self {
        self.crop = crop;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Display name for a file: everything before the first `.`.
///
/// ```
/// # use slicestream::source::name_from_filename;
/// assert_eq!(name_from_filename("chat.part1.png"), "chat");
/// assert_eq!(name_from_filename("README"), "README");
/// ```
pub fn name_from_filename(filename: &str) -> String {
    filename.split('.').next().unwrap_or(filename).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{gradient, png_bytes};

    #[test]
    fn decode_keeps_dimensions_and_identity() {
        let bytes = png_bytes(&gradient(30, 20));
        let src = SourceImage::decode(&RustBackend::new(), "7", "shot", &bytes).unwrap();
        assert_eq!(src.id, "7");
        assert_eq!(src.name, "shot");
        assert_eq!(src.dimensions(), (30, 20));
        assert!(src.crop.is_identity());
    }

    #[test]
    fn decode_error_names_the_image() {
        let err = SourceImage::decode(&RustBackend::new(), "1", "broken", b"xx").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn clones_share_pixels() {
        let a = SourceImage::new("a", "a", gradient(5, 5));
        let b = a.clone().with_crop(CropSpec::pad(1));
        assert!(std::ptr::eq(a.pixels(), b.pixels()));
        assert!(a.crop.is_identity());
    }

    #[test]
    fn name_is_stem_before_first_dot() {
        assert_eq!(name_from_filename("a.b.c"), "a");
        assert_eq!(name_from_filename(".hidden"), "");
    }
}
