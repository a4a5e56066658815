//! Rendering fitted formats to image files.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Render format** | crop + `resize_exact` (CatmullRom up, Lanczos3 down) |
//! | **Thumbnail** | `resize_exact` within a bounding box |
//!
//! The module is split into:
//! - **Calculations**: pure thumbnail sizing (format sizing lives in [`fitting`](crate::fitting))
//! - **Parameters**: data structures describing render jobs
//! - **Backend**: [`RenderBackend`] trait + [`RustBackend`]
//! - **Operations**: high-level functions combining fitting + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, RenderBackend};
pub use calculations::thumbnail_dimensions;
pub use operations::{
    FormattedPhoto, RenderError, ThumbnailConfig, create_thumbnail, execute_render, get_dimensions,
    plan_render, plan_thumbnail, render_format,
};
pub use params::{Quality, RenderParams, ThumbnailParams};
pub use rust_backend::{RustBackend, can_encode, filter_for};
