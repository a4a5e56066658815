//! # Photo Formats
//!
//! Fits photos into named output formats. A format is a target rectangle
//! with an optional taller "flexible" height and an optional permission to
//! upscale. Given a source size and, optionally, a manual crop, the fitter
//! decides which rectangle to cut from the source and how large the output
//! should be. The renderer then applies that decision to real pixels.
//!
//! # Architecture: Geometry First, Pixels Last
//!
//! ```text
//! source size + crop + format  →  FormatFitter::fit  →  FitResult
//! FitResult + source file      →  RenderBackend       →  output file
//! ```
//!
//! All fitting is a pure function of integers. That keeps the decisions
//! deterministic and testable without decoding a single image, and lets the
//! `fit` command answer "what would this produce?" instantly.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fitting`] | Geometry types, [`FormatSpec`](fitting::FormatSpec), and the [`FormatFitter`](fitting::FormatFitter) |
//! | [`render`] | [`RenderBackend`](render::RenderBackend) trait, pure-Rust backend, thumbnail sizing |
//! | [`process`] | One source into every configured format in parallel, plus a JSON manifest |
//! | [`config`] | `photo-formats.toml` loading, merging onto stock defaults, and validation |
//! | [`output`] | CLI output formatting for each command |
//!
//! # Design Decisions
//!
//! ## Integer Flooring
//!
//! Crop offsets and output sizes are computed with integer division, always
//! rounding down, with 64-bit intermediates. Outputs never exceed their
//! format, and the same inputs give the same pixels on every platform.
//!
//! ## Manual Crops Are Never Rewritten
//!
//! A manual crop either fits the source and matches the format's ratio, or
//! the fit fails with an error naming the offending values. The fitter only
//! invents crops for [`Crop::Auto`](fitting::Crop::Auto).
//!
//! ## Pure-Rust Imaging
//!
//! The [`render`] module decodes and encodes with the `image` crate: bicubic
//! resampling when stretching, Lanczos3 when shrinking. No system libraries
//! are needed.

pub mod config;
pub mod fitting;
pub mod output;
pub mod process;
pub mod render;
