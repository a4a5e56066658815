//! Output format specifications.
//!
//! A format is a target rectangle (`max_width` x `max_height`) that many
//! photos are rendered against. A *flexible* format additionally accepts
//! taller output, up to `flexible_max_height`, when the source ratio favors
//! it. A *stretching* format upscales crops smaller than the rectangle.

use super::fitter::FitError;
use super::geometry::ratio;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatSpec {
    pub max_width: u32,
    pub max_height: u32,
    #[serde(default)]
    pub flexible_height: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexible_max_height: Option<u32>,
    #[serde(default)]
    pub stretch: bool,
}

impl FormatSpec {
    /// A non-flexible, non-stretching format.
    pub fn fixed(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            flexible_height: false,
            flexible_max_height: None,
            stretch: false,
        }
    }

    /// A format that may grow up to `flexible_max_height` for tall sources.
    pub fn flexible(max_width: u32, max_height: u32, flexible_max_height: u32) -> Self {
        Self {
            flexible_height: true,
            flexible_max_height: Some(flexible_max_height),
            ..Self::fixed(max_width, max_height)
        }
    }

    pub fn with_stretch(self, stretch: bool) -> Self {
        Self { stretch, ..self }
    }

    /// Check the sizing rules are usable before any fitting happens.
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(FitError::InvalidFormat(format!(
                "max_width and max_height must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        match (self.flexible_height, self.flexible_max_height) {
            (_, Some(0)) => Err(FitError::InvalidFormat(
                "flexible_max_height must be positive".into(),
            )),
            (true, None) => Err(FitError::InvalidFormat(
                "flexible_height requires flexible_max_height".into(),
            )),
            (true, Some(h)) if h < self.max_height => Err(FitError::InvalidFormat(format!(
                "flexible_max_height ({h}) must be at least max_height ({})",
                self.max_height
            ))),
            _ => Ok(()),
        }
    }

    /// `max_width / max_height`.
    pub fn ratio(&self) -> f64 {
        ratio(self.max_width, self.max_height)
    }

    /// The flexible target height, present only when the format is flexible.
    pub fn flexible_target(&self) -> Option<u32> {
        self.flexible_max_height.filter(|_| self.flexible_height)
    }

    /// `max_width / flexible_max_height`: the widest-to-tallest ratio a
    /// flexible format accepts. `None` for fixed formats.
    pub fn flexible_ratio(&self) -> Option<f64> {
        self.flexible_target().map(|h| ratio(self.max_width, h))
    }

    /// Height of the target rectangle, taking the flexible height when `flex`.
    pub fn target_height(&self, flex: bool) -> u32 {
        match self.flexible_target() {
            Some(h) if flex => h,
            _ => self.max_height,
        }
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.max_width, self.max_height)?;
        if let Some(h) = self.flexible_target() {
            write!(f, " (flexible to {h})")?;
        }
        if self.stretch {
            write!(f, " stretch")?;
        }
        Ok(())
    }
}
