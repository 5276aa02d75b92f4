//! CLI output formatting for every command.
//!
//! Output follows one pattern throughout: a header line per entity (positional
//! index + identity + dimensions), with secondary context on indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Inputs
//! 001 top (1080x2400)
//!     Source: shots/top.png
//! 002 bottom (1080x1900)
//!     Source: shots/bottom.png
//!     Crop: top 120 bottom 0 left 0 right 0
//! ```
//!
//! ## Stitch
//!
//! ```text
//! Composite 1080x4180 (2 images)
//! 001 top 1080x2400 at y=0
//! 002 bottom 1080x1780 at y=2400
//! ```
//!
//! ## Plan / Slice
//!
//! ```text
//! Slices (fixed height 1000px, jpeg quality 92)
//! 001 slice_01.jpg 1080x1000 at y=0
//! ...
//! 005 slice_05.jpg 1080x180 at y=4000
//! ```
//!
//! After `slice`, each line also carries the encoded size, followed by a
//! `Wrote 5 slices to out/` summary.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::scan::InputFile;
use crate::slice::{GeneratedSlice, PlannedSlice, SliceSettings};
use crate::source::SourceImage;
use crate::stitch::Composite;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count: `512 B`, `12.3 KB`, `4.1 MB`.
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the input inventory: one header per input with its source path.
pub fn format_inputs(files: &[InputFile], sources: &[SourceImage]) -> Vec<String> {
    let mut lines = vec!["Inputs".to_string()];
    for (pos, (file, source)) in files.iter().zip(sources).enumerate() {
        let (w, h) = source.dimensions();
        lines.push(format!(
            "{} {} ({}x{})",
            format_index(pos + 1),
            source.name,
            w,
            h
        ));
        lines.push(format!("    Source: {}", file.path.display()));
        if !source.crop.is_identity() {
            lines.push(format!("    Crop: {}", source.crop));
        }
    }
    lines
}

pub fn print_inputs(files: &[InputFile], sources: &[SourceImage]) {
    for line in format_inputs(files, sources) {
        println!("{}", line);
    }
}

// ============================================================================
// Stitch
// ============================================================================

/// Format the composite summary and where each image landed.
pub fn format_composite(composite: &Composite) -> Vec<String> {
    let mut lines = vec![format!(
        "Composite {}x{} ({})",
        composite.width,
        composite.height,
        plural(composite.placements.len(), "image")
    )];
    for (pos, p) in composite.placements.iter().enumerate() {
        lines.push(format!(
            "{} {} {}x{} at y={}",
            format_index(pos + 1),
            p.name,
            composite.width,
            p.height,
            p.offset_y
        ));
    }
    lines
}

pub fn print_composite(composite: &Composite) {
    for line in format_composite(composite) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan / Slice
// ============================================================================

fn slices_header(settings: &SliceSettings) -> String {
    if settings.format.is_lossy() {
        format!(
            "Slices ({}, {} quality {})",
            settings.mode,
            settings.format,
            settings.quality.percent()
        )
    } else {
        format!("Slices ({}, {})", settings.mode, settings.format)
    }
}

/// Format planned slices: names, sizes and offsets without encoding.
pub fn format_plan(plan: &[PlannedSlice], settings: &SliceSettings) -> Vec<String> {
    let mut lines = vec![slices_header(settings)];
    for s in plan {
        lines.push(format!(
            "{} {} {}x{} at y={}",
            format_index(s.index),
            s.filename,
            s.width,
            s.height,
            s.offset_y
        ));
    }
    lines
}

pub fn print_plan(plan: &[PlannedSlice], settings: &SliceSettings) {
    for line in format_plan(plan, settings) {
        println!("{}", line);
    }
}

/// Format encoded slices with their sizes and a write summary.
pub fn format_slices(
    slices: &[GeneratedSlice],
    settings: &SliceSettings,
    out_dir: &Path,
) -> Vec<String> {
    let mut lines = vec![slices_header(settings)];
    for s in slices {
        lines.push(format!(
            "{} {} {}x{} at y={}, {}",
            format_index(s.index),
            s.filename,
            s.width,
            s.height,
            s.offset_y,
            format_size(s.bytes.len())
        ));
    }
    lines.push(format!(
        "Wrote {} to {}",
        plural(slices.len(), "slice"),
        out_dir.display()
    ));
    lines
}

pub fn print_slices(slices: &[GeneratedSlice], settings: &SliceSettings, out_dir: &Path) {
    for line in format_slices(slices, settings, out_dir) {
        println!("{}", line);
    }
}
