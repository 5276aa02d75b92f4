//! # Slicestream
//!
//! Stitch an ordered set of screenshots into one long image, then cut that
//! image into page-sized slices. The classic use is exporting a scrolled chat
//! or web capture as printable or shareable pages.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Stitch  sources    →  composite   (crop/pad, resample to common width, stack)
//! 2. Slice   composite  →  slices      (partition by height, encode, name)
//! ```
//!
//! Both stages are pure functions of their inputs: no filesystem, no clock.
//! The CLI supplies bytes, today's date, and writes the results. Keeping the
//! date a parameter makes filename expansion testable.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Raster primitives: crop/pad, resample, encode, plus pure dimension math |
//! | [`source`] | Input images with identity, shared pixels, and per-image crop |
//! | [`stitch`] | Stage 1: builds the composite and records where each image landed |
//! | [`partition`] | Slice heights for fixed-height and equal-parts policies |
//! | [`naming`] | `<YYMMDD>` / `<NO>` filename templates |
//! | [`slice`] | Stage 2: partitions, encodes, and names every slice |
//! | [`session`] | Latest-request-wins wrapper with a composite memo |
//! | [`config`] | `slicestream.toml` loading, validation, merging, presets |
//! | [`scan`] | CLI input discovery: files and directories to sources |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## White Canvas
//!
//! Padding and transparent pixels become opaque white. Screenshots are almost
//! always shown on white, and JPEG has no alpha channel anyway, so the
//! composite is opaque from the start.
//!
//! ## Remainder Goes Last
//!
//! Equal-parts slicing puts every leftover row on the final slice instead of
//! spreading them. `1000` px in 3 parts is always `333, 333, 334`.
//!
//! ## All-or-Nothing Encoding
//!
//! One failed slice fails the batch. Callers never receive a set of pages with
//! a gap in the middle.
//!
//! ## Latest Request Wins
//!
//! Interactive callers re-stitch on every edit. [`session::Session`] tags each
//! request with a ticket and drops results for anything but the newest one,
//! so a slow old run can never overwrite a fresh preview.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod partition;
pub mod scan;
pub mod session;
pub mod slice;
pub mod source;
pub mod stitch;

#[cfg(test)]
pub(crate) mod test_helpers;
