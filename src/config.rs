//! Configuration module.
//!
//! Handles loading, validating, and merging the TOML configuration: fitter
//! policy constants, the encoding quality table, the thumbnail box, and the
//! named output formats.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [fitting]
//! ratio_tolerance = 0.01    # Manual crop vs. fixed format ratio, absolute
//!
//! [quality]
//! default = 85              # Used when a format names no quality
//! presets = { low = 45, medium = 65, good = 75, better = 85, high = 95 }
//!
//! [thumbnail]
//! size = [80, 80]           # Bounding box, never enlarged
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [formats.detail]          # One table per named format
//! max_width = 600
//! max_height = 400
//! flexible_height = true
//! flexible_max_height = 800
//! stretch = false
//! quality = 85              # Must be one of the preset values
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. User values
//! are merged on top of the stock defaults, then validated as a whole.
//! Unknown keys are rejected to catch typos early.

use crate::fitting::{FitterConfig, FormatFitter, FormatSpec};
use crate::render::{Quality, ThumbnailConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from the TOML file.
///
/// All fields have defaults; user files need only specify what they change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Fitter policy constants.
    pub fitting: FitterConfig,
    /// Encoding quality table.
    pub quality: QualityConfig,
    /// Thumbnail bounding box.
    pub thumbnail: ThumbnailSettings,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Named output formats.
    pub formats: BTreeMap<String, FormatConfig>,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.fitting.ratio_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::Validation(
                "fitting.ratio_tolerance must be a non-negative number".into(),
            ));
        }
        if let Some((name, _)) = self
            .quality
            .presets
            .iter()
            .find(|(_, q)| !(1..=100).contains(*q))
        {
            return Err(ConfigError::Validation(format!(
                "quality.presets.{name} must be 1-100"
            )));
        }
        if !self.quality.is_preset(self.quality.default) {
            return Err(ConfigError::Validation(format!(
                "quality.default ({}) must be one of the preset values",
                self.quality.default
            )));
        }
        if self.thumbnail.size[0] == 0 || self.thumbnail.size[1] == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.size values must be non-zero".into(),
            ));
        }
        for (name, format) in &self.formats {
            format
                .spec()
                .validate()
                .map_err(|e| ConfigError::Validation(format!("formats.{name}: {e}")))?;
            if let Some(q) = format.quality
                && !self.quality.is_preset(q)
            {
                return Err(ConfigError::Validation(format!(
                    "formats.{name}.quality ({q}) must be one of the preset values"
                )));
            }
        }
        Ok(())
    }

    /// A fitter carrying this config's policy constants.
    pub fn fitter(&self) -> FormatFitter {
        FormatFitter::new(self.fitting)
    }

    pub fn format(&self, name: &str) -> Option<&FormatConfig> {
        self.formats.get(name)
    }

    /// Encoding quality for a format, falling back to `quality.default`.
    pub fn quality_for(&self, format: &FormatConfig) -> Quality {
        Quality::new(format.quality.unwrap_or(self.quality.default))
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            size: (self.thumbnail.size[0], self.thumbnail.size[1]),
            quality: Quality::new(self.quality.default),
        }
    }
}

/// Encoding quality settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// Quality used when a format does not name one.
    pub default: u32,
    /// Named quality levels; formats may only use these values.
    pub presets: BTreeMap<String, u32>,
}

impl QualityConfig {
    pub fn is_preset(&self, quality: u32) -> bool {
        self.presets.values().any(|&q| q == quality)
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        let presets = [
            ("low", 45),
            ("medium", 65),
            ("good", 75),
            ("better", 85),
            ("high", 95),
        ]
        .into_iter()
        .map(|(name, q)| (name.to_string(), q))
        .collect();
        Self {
            default: 85,
            presets,
        }
    }
}

/// Thumbnail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    /// Bounding box as `[width, height]`.
    pub size: [u32; 2],
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self { size: [80, 80] }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// A named output format as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    pub max_width: u32,
    pub max_height: u32,
    #[serde(default)]
    pub flexible_height: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexible_max_height: Option<u32>,
    #[serde(default)]
    pub stretch: bool,
    /// Encoding quality; one of the preset values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

impl FormatConfig {
    /// The sizing rules the fitter works with.
    pub fn spec(&self) -> FormatSpec {
        FormatSpec {
            max_width: self.max_width,
            max_height: self.max_height,
            flexible_height: self.flexible_height,
            flexible_max_height: self.flexible_max_height,
            stretch: self.stretch,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
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

/// Load config from `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Formats Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults, except the example formats.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Fitting
# ---------------------------------------------------------------------------
[fitting]
# How far a manual crop's width/height ratio may stray from a fixed format's
# ratio and still be accepted. Absolute, not relative. Flexible formats
# accept any ratio between their fixed and flexible shapes instead.
ratio_tolerance = 0.01

# ---------------------------------------------------------------------------
# Encoding quality
# ---------------------------------------------------------------------------
[quality]
# Quality for formats that do not name one. Must be a preset value.
default = 85

# Allowed quality levels (1-100). Applies to JPEG output.
[quality.presets]
low = 45
medium = 65
good = 75
better = 85
high = 95

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnail]
# Bounding box as [width, height]. Thumbnails keep the source aspect ratio
# and are never enlarged.
size = [80, 80]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Formats
# ---------------------------------------------------------------------------
# Each [formats.NAME] table is a target rectangle photos are rendered into.
#
#   max_width, max_height  the rectangle (required)
#   flexible_height        allow taller output for tall sources
#   flexible_max_height    the taller height (required with flexible_height)
#   stretch                upscale photos smaller than the rectangle
#   quality                one of the preset values (default: quality.default)

[formats.listing]
max_width = 200
max_height = 150
stretch = true
quality = 75

[formats.detail]
max_width = 600
max_height = 400
flexible_height = true
flexible_max_height = 800
"##
}
