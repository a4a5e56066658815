//! Render backend trait and shared types.
//!
//! The [`RenderBackend`] trait is the seam between fitting and pixels: it
//! identifies source sizes, applies a [`FitResult`](crate::fitting::FitResult)
//! to a source file, and renders thumbnails.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{RenderParams, ThumbnailParams};
use crate::fitting::SourceImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for render backends.
///
/// `Sync` so one backend can serve parallel format renders.
pub trait RenderBackend: Sync {
    /// Read the pixel dimensions of a source image.
    fn identify(&self, path: &Path) -> Result<SourceImage, BackendError>;

    /// Crop, resample and encode one fitted format.
    fn render(&self, params: &RenderParams) -> Result<(), BackendError>;

    /// Resize a source into a thumbnail and encode it.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
