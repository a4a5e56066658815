//! Rectangle and ratio arithmetic.
//!
//! Everything here is plain value math on integer pixel coordinates. Ratios
//! are always `width / height` computed in `f64`; sums that could overflow a
//! `u32` (`left + width` on very large sources) are widened to `u64`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing a size (`WxH`) or rectangle (`L,T,W,H`) from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse {input:?}: expected {expected}")]
pub struct ParseGeometryError {
    input: String,
    expected: &'static str,
}

/// `width / height` as a float.
///
/// Callers guarantee `height > 0`; the fitter validates sources and crops
/// before computing any ratio.
pub fn ratio(width: u32, height: u32) -> f64 {
    f64::from(width) / f64::from(height)
}

/// Whether two ratios agree within an absolute tolerance.
pub fn ratios_match(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Whether `value` lies in the closed band between `low` and `high`.
pub fn ratio_within(value: f64, low: f64, high: f64) -> bool {
    value >= low && value <= high
}

/// Pixel dimensions of a decoded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A source with a zero dimension has no pixels to crop from.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn ratio(self) -> f64 {
        ratio(self.width, self.height)
    }

    /// The rectangle covering the whole image.
    pub fn full_rect(self) -> CropRect {
        CropRect::new(0, 0, self.width, self.height)
    }
}

impl fmt::Display for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WxH`, e.g. `1920x1080`.
impl FromStr for SourceImage {
    type Err = ParseGeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGeometryError {
            input: s.to_string(),
            expected: "WIDTHxHEIGHT",
        };
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
        let width = w.trim().parse().map_err(|_| err())?;
        let height = h.trim().parse().map_err(|_| err())?;
        Ok(Self { width, height })
    }
}

/// A crop region in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn ratio(&self) -> f64 {
        ratio(self.width, self.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        u64::from(self.left) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        u64::from(self.top) + u64::from(self.height)
    }

    /// Whether the rectangle is non-empty and lies entirely inside `source`.
    pub fn fits_in(&self, source: SourceImage) -> bool {
        !self.is_empty()
            && self.right() <= u64::from(source.width)
            && self.bottom() <= u64::from(source.height)
    }

    /// Strictly smaller than `width` x `height` on both axes.
    pub fn is_smaller_than(&self, width: u32, height: u32) -> bool {
        self.width < width && self.height < height
    }

    /// At most `width` x `height` on both axes.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width <= width && self.height <= height
    }

    /// Larger than `width` x `height` on at least one axis.
    pub fn exceeds(&self, width: u32, height: u32) -> bool {
        self.width > width || self.height > height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Parses `LEFT,TOP,WIDTH,HEIGHT`, e.g. `50,0,100,100`.
impl FromStr for CropRect {
    type Err = ParseGeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGeometryError {
            input: s.to_string(),
            expected: "LEFT,TOP,WIDTH,HEIGHT",
        };
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err())?;
        match parts.as_slice() {
            &[left, top, width, height] => Ok(Self::new(left, top, width, height)),
            _ => Err(err()),
        }
    }
}
