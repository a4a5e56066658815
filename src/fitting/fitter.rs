//! The format-fitting engine.
//!
//! [`FormatFitter::fit`] turns a source size, an optional manual crop and a
//! [`FormatSpec`] into a [`FitResult`]: the crop rectangle to cut from the
//! source and the size to resample that crop to.
//!
//! ## Decision table
//!
//! | Crop vs. format | Auto crop | Manual crop |
//! |---|---|---|
//! | smaller on both axes | keep, or stretch if the format stretches | same |
//! | larger on some axis | re-crop to the format ratio, then shrink | shrink only |
//! | touching a bound, larger on none | keep | keep |
//!
//! Auto crops on flexible formats pick between the fixed and the flexible
//! target ratio, whichever the source is closer to (sources taller than the
//! flexible ratio always take it).
//!
//! All arithmetic floors, so outputs never exceed the target rectangle.

use super::format::FormatSpec;
use super::geometry::{CropRect, SourceImage, ratio, ratio_within, ratios_match};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Absolute tolerance for matching a manual crop against a fixed format ratio.
pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.01;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("crop {crop} does not fit into the {image} source image")]
    InvalidCrop { crop: CropRect, image: SourceImage },
    #[error("crop ratio {ratio:.4} does not agree with the format (accepted {min:.4}..={max:.4})")]
    RatioMismatch { ratio: f64, min: f64, max: f64 },
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("source image {0} has no pixels")]
    EmptySource(SourceImage),
}

/// Policy constants for the fitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitterConfig {
    /// Absolute tolerance when comparing a manual crop ratio to a fixed
    /// format ratio. Flexible formats use their ratio band instead.
    pub ratio_tolerance: f64,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            ratio_tolerance: DEFAULT_RATIO_TOLERANCE,
        }
    }
}

/// Where the crop rectangle comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crop {
    /// Start from the whole source; the fitter may re-crop it to the format.
    Auto,
    /// A user-chosen rectangle. Validated, never altered.
    Manual(CropRect),
}

impl From<Option<CropRect>> for Crop {
    fn from(rect: Option<CropRect>) -> Self {
        rect.map_or(Crop::Auto, Crop::Manual)
    }
}

/// Which resize path produced the output size.
///
/// Renderers pick the resampling filter from this: an upscale-quality filter
/// for `Stretch`, a high-quality downscale filter for `Shrink`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resize {
    /// Output is the crop at its own size.
    #[default]
    None,
    /// Crop scaled to fill the format rectangle.
    Stretch,
    /// Crop scaled down to fit the format rectangle.
    Shrink,
}

/// Outcome of fitting one source against one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FitResult {
    /// Rectangle to cut from the source, in source pixels.
    pub crop: CropRect,
    /// Whether `crop` was derived by the fitter rather than supplied.
    pub auto: bool,
    pub output_width: u32,
    pub output_height: u32,
    pub resize: Resize,
    /// Whether the flexible target height was selected.
    pub flex: bool,
}

impl FitResult {
    fn unchanged(crop: CropRect, auto: bool, flex: bool) -> Self {
        Self {
            crop,
            auto,
            output_width: crop.width,
            output_height: crop.height,
            resize: Resize::None,
            flex,
        }
    }

    fn resized(crop: CropRect, auto: bool, flex: bool, size: (u32, u32), resize: Resize) -> Self {
        Self {
            crop,
            auto,
            output_width: size.0,
            output_height: size.1,
            resize,
            flex,
        }
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }
}

/// Check a manual crop lies inside the source and is non-empty.
pub fn validate_manual_crop(source: SourceImage, crop: CropRect) -> Result<(), FitError> {
    if crop.fits_in(source) {
        Ok(())
    } else {
        Err(FitError::InvalidCrop {
            crop,
            image: source,
        })
    }
}

/// Largest size with the crop's ratio that fits the format rectangle.
///
/// The target height is `flexible_max_height` when `flex` is set, otherwise
/// `max_height`. The axis the crop is relatively longer on is pinned to the
/// target; the other is floored, capped at the target and kept at least one
/// pixel. Grows or shrinks as needed.
///
/// Fails with [`FitError::InvalidFormat`] for a format that does not pass
/// [`FormatSpec::validate`].
pub fn stretch_dimension(
    crop: CropRect,
    format: &FormatSpec,
    flex: bool,
) -> Result<(u32, u32), FitError> {
    format.validate()?;
    Ok(target_dimension(crop, format, flex))
}

/// [`stretch_dimension`] for a format already validated by [`FormatFitter::fit`].
fn target_dimension(crop: CropRect, format: &FormatSpec, flex: bool) -> (u32, u32) {
    let target_width = format.max_width;
    let target_height = format.target_height(flex);
    let crop_ratio = crop.ratio();
    let format_ratio = ratio(target_width, target_height);

    if format_ratio < crop_ratio {
        let height = (f64::from(target_width) / crop_ratio) as u32;
        (target_width, height.clamp(1, target_height))
    } else {
        let width = (f64::from(target_height) * crop_ratio) as u32;
        (width.clamp(1, target_width), target_height)
    }
}

/// Computes crops and output sizes for formats.
///
/// Stateless apart from its policy constants; share one instance freely
/// across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormatFitter {
    config: FitterConfig,
}

impl FormatFitter {
    pub fn new(config: FitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitterConfig {
        &self.config
    }

    /// Check a manual crop's ratio is one the format accepts.
    pub fn validate_crop_ratio(&self, crop: CropRect, format: &FormatSpec) -> Result<(), FitError> {
        let crop_ratio = crop.ratio();
        let (min, max, ok) = match format.flexible_ratio() {
            // Taller flexible heights give the lower bound.
            Some(low) => {
                let high = format.ratio();
                (low, high, ratio_within(crop_ratio, low, high))
            }
            None => {
                let expected = format.ratio();
                let tolerance = self.config.ratio_tolerance;
                (
                    expected - tolerance,
                    expected + tolerance,
                    ratios_match(crop_ratio, expected, tolerance),
                )
            }
        };

        if ok {
            Ok(())
        } else {
            Err(FitError::RatioMismatch {
                ratio: crop_ratio,
                min,
                max,
            })
        }
    }

    /// Fit `source` into `format`, honoring a manual crop when given.
    pub fn fit(
        &self,
        source: SourceImage,
        crop: Crop,
        format: &FormatSpec,
    ) -> Result<FitResult, FitError> {
        format.validate()?;
        if source.is_empty() {
            return Err(FitError::EmptySource(source));
        }

        let (rect, auto) = match crop {
            Crop::Manual(rect) => {
                validate_manual_crop(source, rect)?;
                self.validate_crop_ratio(rect, format)?;
                (rect, false)
            }
            Crop::Auto => (source.full_rect(), true),
        };

        let result = if rect.is_smaller_than(format.max_width, format.max_height) {
            keep_or_stretch(rect, auto, false, format)
        } else if rect.exceeds(format.max_width, format.max_height) {
            if auto {
                auto_fit(source, format)
            } else {
                shrink(rect, false, false, format)
            }
        } else {
            FitResult::unchanged(rect, auto, false)
        };

        debug!(
            source = %source,
            format = %format,
            crop = %result.crop,
            auto = result.auto,
            output_width = result.output_width,
            output_height = result.output_height,
            resize = ?result.resize,
            flex = result.flex,
            "Fitted format"
        );

        Ok(result)
    }
}

fn keep_or_stretch(crop: CropRect, auto: bool, flex: bool, format: &FormatSpec) -> FitResult {
    if format.stretch {
        let size = target_dimension(crop, format, false);
        FitResult::resized(crop, auto, flex, size, Resize::Stretch)
    } else {
        FitResult::unchanged(crop, auto, flex)
    }
}

fn shrink(crop: CropRect, auto: bool, flex: bool, format: &FormatSpec) -> FitResult {
    let size = target_dimension(crop, format, flex);
    FitResult::resized(crop, auto, flex, size, Resize::Shrink)
}

/// Re-crop the full source to the format ratio, then shrink into the format.
fn auto_fit(source: SourceImage, format: &FormatSpec) -> FitResult {
    let full = source.full_rect();
    let my_ratio = source.ratio();
    let mut format_ratio = format.ratio();
    let mut working_height = format.max_height;
    let mut flex = false;

    if let Some(flexible_height) = format.flexible_target()
        && my_ratio < format_ratio
    {
        let format_ratio2 = ratio(format.max_width, flexible_height);
        if my_ratio < format_ratio2
            || (format_ratio - my_ratio).abs() > (format_ratio2 - my_ratio).abs()
        {
            flex = true;
            working_height = flexible_height;
            format_ratio = format_ratio2;
        }
    }

    if full.fits_within(format.max_width, working_height) {
        return keep_or_stretch(full, true, flex, format);
    }

    let crop = if my_ratio > format_ratio {
        trim_width(source, format.max_width, working_height)
    } else if my_ratio < format_ratio {
        trim_height(source, format.max_width, working_height)
    } else {
        full
    };

    shrink(crop, true, flex, format)
}

/// Cut equal strips from the left and right so the source matches
/// `target_width / target_height`.
fn trim_width(source: SourceImage, target_width: u32, target_height: u32) -> CropRect {
    let kept = u64::from(target_width) * u64::from(source.height) / u64::from(target_height);
    let kept = kept.clamp(1, u64::from(source.width)) as u32;
    let diff = source.width - kept;
    CropRect::new(diff / 2, 0, source.width - diff, source.height)
}

/// Cut equal strips from the top and bottom so the source matches
/// `target_width / target_height`.
fn trim_height(source: SourceImage, target_width: u32, target_height: u32) -> CropRect {
    let kept = u64::from(target_height) * u64::from(source.width) / u64::from(target_width);
    let kept = kept.clamp(1, u64::from(source.height)) as u32;
    let diff = source.height - kept;
    CropRect::new(0, diff / 2, source.width, source.height - diff)
}
