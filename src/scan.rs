//! Input discovery for the CLI.
//!
//! Turns the paths given on the command line into an ordered list of image
//! files, then reads and decodes them into [`SourceImage`]s. The library core
//! never touches the filesystem; this module is where files become sources.
//!
//! ## Ordering
//!
//! Input order is stitch order (top to bottom):
//!
//! - File arguments keep their command-line position.
//! - A directory argument expands in place to its image files, sorted by file
//!   name. Subdirectories and hidden files are skipped.
//!
//! ```text
//! slicestream slice intro.png shots/ outro.png
//!   001 intro       intro.png
//!   002 01-top      shots/01-top.png
//!   003 02-bottom   shots/02-bottom.jpg
//!   004 outro       outro.png
//! ```
//!
//! Explicit file arguments must have a supported extension; a typo'd
//! `chat.pgn` fails loudly instead of being silently ignored.

use crate::imaging::{RasterBackend, supported_input_extensions};
use crate::source::{SourceError, SourceImage, name_from_filename};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a supported image file: {0}")]
    Unsupported(PathBuf),
    #[error("No input images found")]
    NoInputs,
    #[error(transparent)]
    Source(#[from] SourceError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ScanError + '_ {
    move |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// An input file with the identity it will carry through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFile {
    /// 1-based position, zero-padded: `"001"`.
    pub id: String,
    /// File name up to the first `.`.
    pub name: String,
    pub path: PathBuf,
}

/// Expand command-line paths into ordered input files.
pub fn scan(inputs: &[PathBuf]) -> Result<Vec<InputFile>, ScanError> {
    let mut paths = Vec::new();
    for input in inputs {
        let meta = fs::metadata(input).map_err(io_error(input))?;
        if meta.is_dir() {
            paths.extend(collect_images(input)?);
        } else if is_image(input) {
            paths.push(input.clone());
        } else {
            return Err(ScanError::Unsupported(input.clone()));
        }
    }

    if paths.is_empty() {
        return Err(ScanError::NoInputs);
    }

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            InputFile {
                id: format!("{:03}", i + 1),
                name: name_from_filename(&filename),
                path,
            }
        })
        .collect())
}

fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let hidden = p
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            !hidden && p.is_file() && is_image(p)
        })
        .collect();

    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), images = entries.len(), "expanded directory");
    Ok(entries)
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

/// Read and decode every input, in parallel, preserving order.
pub fn load_sources(
    backend: &impl RasterBackend,
    files: &[InputFile],
) -> Result<Vec<SourceImage>, ScanError> {
    files
        .par_iter()
        .map(|file| -> Result<SourceImage, ScanError> {
            let bytes = fs::read(&file.path).map_err(io_error(&file.path))?;
            Ok(SourceImage::decode(
                backend,
                file.id.clone(),
                file.name.clone(),
                &bytes,
            )?)
        })
        .collect()
}
