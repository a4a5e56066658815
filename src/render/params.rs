//! Parameter types for render operations.
//!
//! These structs describe *what* to render, not *how*. They sit between the
//! [`operations`](super::operations) module (which fits formats and decides
//! what files to produce) and the [`backend`](super::backend) (which does the
//! pixel work), so operations can be tested against a mock backend.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`RenderParams`]: source, output, the [`FitResult`] to apply, quality.
//! - [`ThumbnailParams`]: source, output, final thumbnail size, quality.

use crate::fitting::FitResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Parameters for rendering one fitted format.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Crop to cut and size to resample to.
    pub fit: FitResult,
    pub quality: Quality,
}

/// Parameters for a thumbnail (resize within a box, never enlarged).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Final thumbnail dimensions.
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
