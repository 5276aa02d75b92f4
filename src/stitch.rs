//! Vertical stitching of source images into one composite raster.
//!
//! ## Steps
//!
//! 1. Apply each image's crop/pad to get its effective size.
//! 2. Pick the common width: explicit if given, else the widest effective image.
//! 3. Compute each image's resampled height (rounded independently).
//! 4. Allocate the composite: common width × sum of heights.
//! 5. Draw each resampled image at the running sum of previous heights,
//!    blending any transparency onto the white canvas.
//!
//! Steps 1 and 3 are pure arithmetic and run before any pixel work, so an
//! invalid crop or an oversized composite fails fast.
//!
//! ## Parallel Processing
//!
//! Per-image crop/pad + resample run in parallel with rayon. Results are
//! collected in input order and drawn at precomputed offsets, so the output
//! never depends on which image finished first.

use crate::imaging::{
    BackendError, OutputFormat, Quality, RasterBackend, common_width, crop_pad,
    effective_dimensions, resample_to_width, resampled_height,
};
use crate::source::SourceImage;
use image::RgbaImage;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span};

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("No images to stitch")]
    EmptyInput,
    #[error("Invalid crop dimensions for image '{name}' ({id}): result would be {width}x{height}")]
    InvalidCrop {
        id: String,
        name: String,
        width: i64,
        height: i64,
    },
    #[error("Cannot allocate a {width}x{height} composite")]
    RasterContext { width: u32, height: u32 },
    #[error("Processing image '{name}' ({id}) failed: {source}")]
    Backend {
        id: String,
        name: String,
        #[source]
        source: BackendError,
    },
}

/// Where one source image landed in the composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub id: String,
    pub name: String,
    /// Size after crop/pad, before resampling.
    pub effective_width: u32,
    pub effective_height: u32,
    pub offset_y: u32,
    /// Resampled height; the composite row span is `offset_y..offset_y + height`.
    pub height: u32,
}

/// The stitched raster plus its layout.
#[derive(Debug, Clone)]
pub struct Composite {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
    pub placements: Vec<Placement>,
}

/// PNG-encoded composite for display.
#[derive(Debug, Clone)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Composite {
    /// Encode the whole composite as PNG.
    pub fn encode_preview(&self, backend: &impl RasterBackend) -> Result<Preview, BackendError> {
        let png = backend.encode(&self.pixels, OutputFormat::Png, Quality::default())?;
        Ok(Preview {
            width: self.width,
            height: self.height,
            png,
        })
    }
}

/// Layout computed before any pixels are touched.
struct Plan {
    width: u32,
    placements: Vec<Placement>,
}

fn plan(images: &[SourceImage], target_width: Option<u32>) -> Result<Plan, StitchError> {
    let effective = images
        .iter()
        .map(|img| {
            effective_dimensions(img.dimensions(), img.crop).map_err(|(width, height)| {
                StitchError::InvalidCrop {
                    id: img.id.clone(),
                    name: img.name.clone(),
                    width,
                    height,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let width = common_width(target_width, effective.iter().map(|&(w, _)| w))
        .ok_or(StitchError::EmptyInput)?;

    let mut offset_y: u64 = 0;
    let mut placements = Vec::with_capacity(images.len());
    for (img, &(ew, eh)) in images.iter().zip(&effective) {
        let height = resampled_height((ew, eh), width);
        let offset = u32::try_from(offset_y).map_err(|_| StitchError::RasterContext {
            width,
            height: u32::MAX,
        })?;
        placements.push(Placement {
            id: img.id.clone(),
            name: img.name.clone(),
            effective_width: ew,
            effective_height: eh,
            offset_y: offset,
            height,
        });
        offset_y += height as u64;
    }
    if offset_y > u32::MAX as u64 {
        return Err(StitchError::RasterContext {
            width,
            height: u32::MAX,
        });
    }

    Ok(Plan { width, placements })
}

fn backend_error(id: &str, name: &str, source: BackendError) -> StitchError {
    match source {
        BackendError::RasterContext { width, height } => {
            StitchError::RasterContext { width, height }
        }
        source => StitchError::Backend {
            id: id.to_string(),
            name: name.to_string(),
            source,
        },
    }
}

/// Crop/pad then resample one image to the common width.
fn prepare(
    backend: &impl RasterBackend,
    img: &SourceImage,
    width: u32,
) -> Result<RgbaImage, StitchError> {
    let effective = crop_pad(backend, img.pixels(), img.crop)
        .map_err(|e| backend_error(&img.id, &img.name, e))?;
    let resampled = resample_to_width(backend, &effective, width)
        .map_err(|e| backend_error(&img.id, &img.name, e))?;
    debug!(
        id = %img.id,
        effective = ?effective.dimensions(),
        resampled = ?resampled.dimensions(),
        "prepared image"
    );
    Ok(resampled)
}

/// Composite size for `images` without touching pixels.
///
/// Same errors as [`stitch`] minus allocation and backend failures.
pub fn measure(
    images: &[SourceImage],
    target_width: Option<u32>,
) -> Result<(u32, u32, Vec<Placement>), StitchError> {
    if images.is_empty() {
        return Err(StitchError::EmptyInput);
    }
    let plan = plan(images, target_width)?;
    let height = plan.placements.iter().map(|p| p.height).sum();
    Ok((plan.width, height, plan.placements))
}

/// Stitch `images` top to bottom, in order, at a common width.
///
/// `target_width` of `None` or `Some(0)` means "widest effective image".
pub fn stitch(
    backend: &impl RasterBackend,
    images: &[SourceImage],
    target_width: Option<u32>,
) -> Result<Composite, StitchError> {
    let _span = info_span!("stitch", images = images.len()).entered();

    let (width, height, placements) = measure(images, target_width)?;

    let mut canvas = backend
        .allocate(width, height)
        .map_err(|e| backend_error("composite", "composite", e))?;

    let prepared: Vec<Result<RgbaImage, StitchError>> = images
        .par_iter()
        .map(|img| prepare(backend, img, width))
        .collect();

    for (resampled, placement) in prepared.into_iter().zip(&placements) {
        let resampled = resampled?;
        image::imageops::overlay(&mut canvas, &resampled, 0, placement.offset_y as i64);
    }

    info!(width, height, images = images.len(), "stitched composite");
    Ok(Composite {
        width,
        height,
        pixels: canvas,
        placements,
    })
}
