//! Slicing a composite into named, encoded output images.
//!
//! The composite is partitioned into bands ([`partition`](crate::partition)),
//! each band is encoded at full composite width, and each gets a filename from
//! the template ([`naming`](crate::naming)).
//!
//! ## Failure policy
//!
//! Encoding is all-or-nothing. If any band fails to encode, the whole batch
//! fails with the lowest failing slice index and no slices are returned. A
//! download that silently lacks a page is worse than no download.
//!
//! Equal-parts policies asking for more parts than the composite has rows are
//! rejected before any band is planned, since they always yield empty bands.
//!
//! ## Parallel Processing
//!
//! Bands are encoded in parallel with rayon and collected by index, so slice
//! order always matches vertical order in the composite.

use crate::imaging::{BackendError, OutputFormat, Quality, RasterBackend, encode_band};
use crate::naming::slice_filename;
use crate::partition::{SliceMode, slice_bands};
use crate::stitch::Composite;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span};

#[derive(Error, Debug)]
pub enum SliceError {
    #[error("Encoding slice {index} ({filename}) failed: {source}")]
    Encode {
        index: usize,
        filename: String,
        #[source]
        source: BackendError,
    },
    #[error("Cannot cut a {height}px composite into {parts} parts")]
    TooManyParts { parts: u32, height: u32 },
}

/// Everything the slice stage needs besides the composite.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSettings {
    pub mode: SliceMode,
    pub format: OutputFormat,
    /// Only used by lossy formats.
    pub quality: Quality,
    /// Filename template, see [`naming`](crate::naming).
    pub prefix: String,
}

/// A slice before encoding: where it is and what it will be called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSlice {
    pub index: usize,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    pub filename: String,
}

/// An encoded slice, ready to be written or downloaded.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSlice {
    /// Unique within a batch: `"{index}-{offset_y}"`.
    pub id: String,
    pub index: usize,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    pub filename: String,
    pub format: OutputFormat,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Lay out slices for a composite of `width × height` without encoding.
///
/// Fails with [`SliceError::TooManyParts`] when an equal-parts policy would
/// leave a band without rows.
pub fn plan_slices(
    width: u32,
    height: u32,
    settings: &SliceSettings,
    date: NaiveDate,
) -> Result<Vec<PlannedSlice>, SliceError> {
    match settings.mode {
        SliceMode::EqualParts(parts) if parts.get() > height => {
            return Err(SliceError::TooManyParts {
                parts: parts.get(),
                height,
            });
        }
        _ => {}
    }
    let planned = slice_bands(height, settings.mode)
        .into_iter()
        .map(|band| PlannedSlice {
            index: band.index,
            offset_y: band.offset_y,
            width,
            height: band.height,
            filename: slice_filename(&settings.prefix, band.index, date, settings.format),
        })
        .collect();
    Ok(planned)
}

/// Partition, encode, and name every slice of `composite`.
///
/// `date` feeds the `<YYMMDD>` token; pass today's date in production.
pub fn slice_composite(
    backend: &impl RasterBackend,
    composite: &Composite,
    settings: &SliceSettings,
    date: NaiveDate,
) -> Result<Vec<GeneratedSlice>, SliceError> {
    let _span = info_span!("slice", mode = %settings.mode, format = %settings.format).entered();

    let planned = plan_slices(composite.width, composite.height, settings, date)?;

    let encoded: Vec<Result<Vec<u8>, BackendError>> = planned
        .par_iter()
        .map(|slice| {
            encode_band(
                backend,
                &composite.pixels,
                slice.offset_y,
                slice.height,
                settings.format,
                settings.quality,
            )
        })
        .collect();

    let slices = planned
        .into_iter()
        .zip(encoded)
        .map(|(slice, bytes)| {
            let bytes = bytes.map_err(|source| SliceError::Encode {
                index: slice.index,
                filename: slice.filename.clone(),
                source,
            })?;
            Ok(GeneratedSlice {
                id: format!("{}-{}", slice.index, slice.offset_y),
                index: slice.index,
                offset_y: slice.offset_y,
                width: slice.width,
                height: slice.height,
                filename: slice.filename,
                format: settings.format,
                bytes,
            })
        })
        .collect::<Result<Vec<_>, SliceError>>()?;

    info!(
        slices = slices.len(),
        bytes = slices.iter().map(|s| s.bytes.len()).sum::<usize>(),
        "sliced composite"
    );
    Ok(slices)
}
