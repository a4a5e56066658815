//! Format fitting: pure geometry, no pixels.
//!
//! | Piece | Role |
//! |---|---|
//! | [`geometry`] | Source sizes, crop rectangles, ratio comparison |
//! | [`format`] | [`FormatSpec`]: target rectangle, flexible height, stretch |
//! | [`fitter`] | [`FormatFitter`]: crop validation, auto-crop, stretch/shrink sizing |
//!
//! Nothing here reads files or touches pixel buffers; the
//! [`render`](crate::render) module consumes [`FitResult`] for that.

pub mod fitter;
pub mod format;
pub mod geometry;

pub use fitter::{
    Crop, DEFAULT_RATIO_TOLERANCE, FitError, FitResult, FitterConfig, FormatFitter, Resize,
    stretch_dimension, validate_manual_crop,
};
pub use format::FormatSpec;
pub use geometry::{CropRect, ParseGeometryError, SourceImage};
