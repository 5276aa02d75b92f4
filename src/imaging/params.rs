//! Parameter types for raster operations.
//!
//! These are plain values describing *what* to do to an image. The
//! [`backend`](super::backend) decides *how*.
//!
//! ## Types
//!
//! - [`CropSpec`]: Signed per-edge adjustment. Positive removes pixels, negative pads with white.
//! - [`OutputFormat`]: Encoded format of a slice or preview (PNG or JPEG).
//! - [`Quality`]: Lossy encoding quality as a fraction in `[0, 1]`. Clamped on construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-edge crop/pad in pixels.
///
/// A positive value removes that many pixels from the edge; a negative value
/// inserts that many pixels of white background before (top/left) or after
/// (bottom/right) the source content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropSpec {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl CropSpec {
    pub fn new(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Pad every edge by `pixels` of white.
    pub fn pad(pixels: i32) -> Self {
        Self::new(-pixels, -pixels, -pixels, -pixels)
    }

    /// The opposite adjustment: a crop becomes a pad of the same size and vice versa.
    pub fn inverse(self) -> Self {
        Self::new(-self.top, -self.bottom, -self.left, -self.right)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for CropSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "top {} bottom {} left {} right {}",
            self.top, self.bottom, self.left, self.right
        )
    }
}

/// Encoded output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[default]
    Jpeg,
}

impl OutputFormat {
    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// Whether [`Quality`] has any effect on this format.
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => f.write_str("png"),
            OutputFormat::Jpeg => f.write_str("jpeg"),
        }
    }
}

/// Quality setting for lossy encoding, as a fraction (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quality(f32);

impl Quality {
    /// Non-finite values fall back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::default()
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1-100 scale JPEG encoders expect.
    pub fn percent(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.92)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_fraction() {
        assert_eq!(Quality::new(-0.5).value(), 0.0);
        assert_eq!(Quality::new(0.5).value(), 0.5);
        assert_eq!(Quality::new(3.0).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN), Quality::default());
    }

    #[test]
    fn quality_default_is_92_percent() {
        assert_eq!(Quality::default().percent(), 92);
    }

    #[test]
    fn quality_percent_never_zero() {
        assert_eq!(Quality::new(0.0).percent(), 1);
        assert_eq!(Quality::new(1.0).percent(), 100);
    }

    #[test]
    fn format_extensions() {
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert!(OutputFormat::Jpeg.is_lossy());
        assert!(!OutputFormat::Png.is_lossy());
    }

    #[test]
    fn crop_inverse_flips_every_edge() {
        let crop = CropSpec::new(10, -4, 3, 0);
        assert_eq!(crop.inverse(), CropSpec::new(-10, 4, -3, 0));
        assert!(CropSpec::default().is_identity());
    }

    #[test]
    fn format_deserializes_lowercase() {
        let f: OutputFormat = serde_json::from_str("\"png\"").unwrap();
        assert_eq!(f, OutputFormat::Png);
    }
}
