//! High-level render operations.
//!
//! These functions combine fitting with backend execution: identify the
//! source, fit it into a format, and hand the result to the backend.

use super::backend::{BackendError, RenderBackend};
use super::calculations::thumbnail_dimensions;
use super::params::{Quality, RenderParams, ThumbnailParams};
use crate::fitting::{Crop, FitError, FitResult, FormatFitter, FormatSpec, SourceImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl RenderBackend, path: &Path) -> Result<SourceImage> {
    Ok(backend.identify(path)?)
}

/// A photo rendered in one format: what gets stored per (photo, format) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedPhoto {
    /// Path of the written file.
    pub output: String,
    /// Source dimensions the fit was computed from.
    pub source: SourceImage,
    pub fit: FitResult,
    pub quality: u32,
}

/// Fit a source into a format and build the render parameters, without
/// touching the backend.
pub fn plan_render(
    fitter: &FormatFitter,
    source: &Path,
    output: &Path,
    dimensions: SourceImage,
    crop: Crop,
    format: &FormatSpec,
    quality: Quality,
) -> Result<RenderParams> {
    let fit = fitter.fit(dimensions, crop, format)?;
    Ok(RenderParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        fit,
        quality,
    })
}

/// Render one source photo in one format.
///
/// A manual crop that does not fit the source or the format's ratio aborts
/// before anything is written.
pub fn render_format(
    backend: &impl RenderBackend,
    fitter: &FormatFitter,
    source: &Path,
    output: &Path,
    crop: Crop,
    format: &FormatSpec,
    quality: Quality,
) -> Result<FormattedPhoto> {
    let dimensions = get_dimensions(backend, source)?;
    let params = plan_render(fitter, source, output, dimensions, crop, format, quality)?;
    execute_render(backend, &params, dimensions)
}

/// Run a planned render and record it. `dimensions` are the source size the
/// plan was fitted from.
pub fn execute_render(
    backend: &impl RenderBackend,
    params: &RenderParams,
    dimensions: SourceImage,
) -> Result<FormattedPhoto> {
    backend.render(params)?;

    Ok(FormattedPhoto {
        output: params.output.to_string_lossy().to_string(),
        source: dimensions,
        fit: params.fit,
        quality: params.quality.value(),
    })
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Bounding box `(width, height)`.
    pub size: (u32, u32),
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: (80, 80),
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    dimensions: SourceImage,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let (width, height) =
        thumbnail_dimensions((dimensions.width, dimensions.height), config.size);

    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Create a thumbnail image. Returns the thumbnail dimensions.
pub fn create_thumbnail(
    backend: &impl RenderBackend,
    source: &Path,
    output: &Path,
    config: &ThumbnailConfig,
) -> Result<(u32, u32)> {
    let dimensions = get_dimensions(backend, source)?;
    let params = plan_thumbnail(source, output, dimensions, config);
    backend.thumbnail(&params)?;
    Ok((params.width, params.height))
}
