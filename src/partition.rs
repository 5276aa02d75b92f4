//! Slice-height partitioning.
//!
//! Pure arithmetic over the composite height: no rasters involved.
//!
//! - **Fixed height**: emit `min(h, remaining)` until nothing remains. Every
//!   slice is `h` tall except possibly the last.
//! - **Equal parts**: `n` slices of `floor(total / n)`, with the whole
//!   remainder added to the last slice. The remainder is never spread out;
//!   users comparing outputs see this tie-break.
//!
//! Policy values are [`NonZeroU32`], so a zero height or count cannot reach
//! these functions. Validation happens where settings are built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Which slicing rule to apply, without its value. Used by config and CLI.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SliceModeKind {
    #[default]
    FixedHeight,
    EqualParts,
}

/// A slicing rule with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceMode {
    /// Slices of this many pixels; the last may be shorter.
    FixedHeight(NonZeroU32),
    /// Exactly this many slices.
    EqualParts(NonZeroU32),
}

impl SliceMode {
    /// Build a mode from its kind and raw value. Returns `None` for zero.
    pub fn new(kind: SliceModeKind, value: u32) -> Option<Self> {
        let value = NonZeroU32::new(value)?;
        Some(match kind {
            SliceModeKind::FixedHeight => SliceMode::FixedHeight(value),
            SliceModeKind::EqualParts => SliceMode::EqualParts(value),
        })
    }

    pub fn kind(self) -> SliceModeKind {
        match self {
            SliceMode::FixedHeight(_) => SliceModeKind::FixedHeight,
            SliceMode::EqualParts(_) => SliceModeKind::EqualParts,
        }
    }

    pub fn value(self) -> u32 {
        match self {
            SliceMode::FixedHeight(v) | SliceMode::EqualParts(v) => v.get(),
        }
    }
}

impl fmt::Display for SliceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceMode::FixedHeight(h) => write!(f, "fixed height {h}px"),
            SliceMode::EqualParts(n) => write!(f, "{n} equal parts"),
        }
    }
}

/// A horizontal band of the composite, 1-indexed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub index: usize,
    pub offset_y: u32,
    pub height: u32,
}

/// Slice heights for `total_height`, summing exactly to it.
///
/// ```
/// # use slicestream::partition::{SliceMode, slice_heights};
/// # use std::num::NonZeroU32;
/// let thirds = SliceMode::EqualParts(NonZeroU32::new(3).unwrap());
/// assert_eq!(slice_heights(1000, thirds), vec![333, 333, 334]);
///
/// let pages = SliceMode::FixedHeight(NonZeroU32::new(100).unwrap());
/// assert_eq!(slice_heights(250, pages), vec![100, 100, 50]);
/// ```
pub fn slice_heights(total_height: u32, mode: SliceMode) -> Vec<u32> {
    match mode {
        SliceMode::EqualParts(n) => {
            let n = n.get();
            let base = total_height / n;
            let remainder = total_height % n;
            let mut heights = vec![base; n as usize];
            if let Some(last) = heights.last_mut() {
                *last += remainder;
            }
            heights
        }
        SliceMode::FixedHeight(h) => {
            let h = h.get();
            let mut heights = Vec::with_capacity(total_height.div_ceil(h) as usize);
            let mut remaining = total_height;
            while remaining > 0 {
                let next = h.min(remaining);
                heights.push(next);
                remaining -= next;
            }
            heights
        }
    }
}

/// Bands for `total_height`: [`slice_heights`] with running offsets.
pub fn slice_bands(total_height: u32, mode: SliceMode) -> Vec<Band> {
    let mut offset_y = 0;
    slice_heights(total_height, mode)
        .into_iter()
        .enumerate()
        .map(|(i, height)| {
            let band = Band {
                index: i + 1,
                offset_y,
                height,
            };
            offset_y += height;
            band
        })
        .collect()
}
