//! Raster operations in pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Crop / pad** | white canvas + `imageops::overlay` |
//! | **Resample** | `imageops::resize` (Lanczos3) |
//! | **Encode** | `PngEncoder` / `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Value types describing crops, formats, and quality
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, RasterBackend};
pub use calculations::{common_width, effective_dimensions, pixel_count, resampled_height};
pub use operations::{crop_pad, encode_band, resample_to_width};
pub use params::{CropSpec, OutputFormat, Quality};
pub use rust_backend::{DEFAULT_MAX_PIXELS, RustBackend, supported_input_extensions};
