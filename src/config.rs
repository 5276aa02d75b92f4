//! Configuration module.
//!
//! Handles loading, validating, and merging `slicestream.toml`. User files are
//! sparse: they are merged key-by-key on top of the stock defaults, so a file
//! only needs the values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [stitch]
//! # target_width = 1080     # Common width; omit for the widest input
//! max_pixels = 268435456    # Largest raster that will be allocated
//!
//! [slice]
//! mode = "fixed-height"     # or "equal-parts"
//! value = 1000              # Pixels per slice, or number of slices
//! format = "jpeg"           # "png" or "jpeg"
//! quality = 0.92            # JPEG quality, 0.0-1.0
//! prefix = "slice"          # Filename template: <YYMMDD>, <NO>
//!
//! [processing]
//! # max_processes = 4       # Max parallel workers (omit for auto = CPU cores)
//!
//! [presets.print]           # Named slice settings, selected with --preset
//! mode = "equal-parts"
//! value = 3
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DEFAULT_MAX_PIXELS, OutputFormat, Quality};
use crate::partition::{SliceMode, SliceModeKind};
use crate::slice::SliceSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "slicestream.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),
}

/// Full configuration loaded from `slicestream.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Composite settings (width, allocation cap).
    pub stitch: StitchConfig,
    /// Default slice settings.
    pub slice: SliceConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Named slice settings. Read-only: nothing writes these back.
    pub presets: BTreeMap<String, SliceConfig>,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stitch.target_width == Some(0) {
            return Err(ConfigError::Validation(
                "stitch.target_width must be positive (omit it for auto)".into(),
            ));
        }
        if self.stitch.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "stitch.max_pixels must be positive".into(),
            ));
        }
        self.slice.validate("slice")?;
        for (name, preset) in &self.presets {
            preset.validate(&format!("presets.{name}"))?;
        }
        Ok(())
    }

    /// Slice settings from `[slice]`, or from a named preset.
    pub fn slice_config(&self, preset: Option<&str>) -> Result<&SliceConfig, ConfigError> {
        match preset {
            None => Ok(&self.slice),
            Some(name) => self
                .presets
                .get(name)
                .ok_or_else(|| ConfigError::UnknownPreset(name.to_string())),
        }
    }
}

/// Composite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StitchConfig {
    /// Common output width. When absent, the widest image (after crop) is used.
    pub target_width: Option<u32>,
    /// Rasters larger than this many pixels fail instead of being allocated.
    pub max_pixels: u64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            target_width: None,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

/// Slicing policy, output format, and filename template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliceConfig {
    pub mode: SliceModeKind,
    /// Pixels per slice (fixed-height) or number of slices (equal-parts).
    pub value: u32,
    pub format: OutputFormat,
    /// JPEG quality as a fraction (0.0 = worst, 1.0 = best).
    pub quality: f32,
    /// Filename template. See [`naming`](crate::naming).
    pub prefix: String,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            mode: SliceModeKind::FixedHeight,
            value: 1000,
            format: OutputFormat::Jpeg,
            quality: 0.92,
            prefix: "slice".to_string(),
        }
    }
}

impl SliceConfig {
    /// Reject values that cannot be sliced with. `section` names the table in messages.
    pub fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.value == 0 {
            return Err(ConfigError::Validation(format!(
                "{section}.value must be positive"
            )));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ConfigError::Validation(format!(
                "{section}.quality must be 0.0-1.0"
            )));
        }
        // Slices are written as `out_dir/<expanded prefix>.<ext>`.
        if self.prefix.contains(['/', '\\'])
            || self.prefix.contains("..")
            || Path::new(&self.prefix).has_root()
        {
            return Err(ConfigError::Validation(format!(
                "{section}.prefix must be a file name, not a path: '{}'",
                self.prefix
            )));
        }
        Ok(())
    }

    /// Validated settings for the slice stage.
    pub fn to_settings(&self) -> Result<SliceSettings, ConfigError> {
        self.validate("slice")?;
        let mode = SliceMode::new(self.mode, self.value)
            .ok_or_else(|| ConfigError::Validation("slice.value must be positive".into()))?;
        Ok(SliceSettings {
            mode,
            format: self.format,
            quality: Quality::new(self.quality),
            prefix: self.prefix.clone(),
        })
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `slicestream.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `slicestream.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `slicestream.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# slicestream configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Stitching
# ---------------------------------------------------------------------------
[stitch]
# Common width every image is scaled to, in pixels.
# Omit to use the widest image (measured after crop/pad).
# target_width = 1080

# Largest raster, in pixels, that will be allocated. Composites or images
# beyond this fail instead of exhausting memory.
max_pixels = 268435456

# ---------------------------------------------------------------------------
# Slicing
# ---------------------------------------------------------------------------
[slice]
# "fixed-height": slices of `value` pixels, the last one may be shorter.
# "equal-parts": exactly `value` slices; leftover rows go to the last one.
mode = "fixed-height"
value = 1000

# Output format: "png" (lossless) or "jpeg".
format = "jpeg"

# JPEG quality from 0.0 (worst) to 1.0 (best). Ignored for PNG.
quality = 0.92

# Filename template. Tokens (case-insensitive, every occurrence replaced):
#   <YYMMDD>  today's date, e.g. 251204
#   <NO>      slice number, starting at 1
# Without <NO>, "_01", "_02", ... is appended. Must be a plain file name:
# no "/", "\", or "..".
prefix = "slice"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
# Named slice settings, selected with `--preset NAME`. Each preset takes the
# same keys as [slice]; missing keys use the built-in defaults, not the
# values set in [slice].
#
# [presets.a4-print]
# mode = "equal-parts"
# value = 3
# format = "png"
# prefix = "print-<YYMMDD>-<NO>"
"##
}
