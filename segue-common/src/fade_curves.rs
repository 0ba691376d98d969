//! Fade curve implementations for volume envelopes
//!
//! Gain curves used when ramping the output volume around a track
//! boundary. Only simple linear and quadratic scaling is provided; the
//! envelope scheduler samples a curve at discrete step positions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fade curve types for volume envelopes
///
/// - Linear: Constant rate of change
/// - Quadratic: Slow start / fast finish on fade-in, fast start / slow finish on fade-out
///
/// Fade-in curves increase volume from 0.0 to 1.0.
/// Fade-out curves decrease volume from 1.0 to 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    /// Linear: v(t) = t (fade-in), v(t) = 1 - t (fade-out)
    Linear,

    /// Quadratic: v(t) = t² (fade-in), v(t) = (1 - t)² (fade-out)
    Quadratic,
}

impl FadeCurve {
    /// Calculate fade-in multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Volume multiplier (0.0 = silence, 1.0 = full volume)
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Quadratic => t * t,
        }
    }

    /// Calculate fade-out multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Volume multiplier (1.0 at start of fade-out, 0.0 at end)
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        let inv = 1.0 - t;

        match self {
            FadeCurve::Linear => inv,
            FadeCurve::Quadratic => inv * inv,
        }
    }

    /// Canonical lowercase name, as written in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Quadratic => "quadratic",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::Quadratic => "Quadratic",
        }
    }

    /// Get all available fade curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[FadeCurve::Linear, FadeCurve::Quadratic]
    }
}

impl FromStr for FadeCurve {
    type Err = crate::Error;

    /// Parse curve from string; accepts `square` as an alias for quadratic
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "quadratic" | "square" => Ok(FadeCurve::Quadratic),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown fade curve '{}'",
                other
            ))),
        }
    }
}

impl Default for FadeCurve {
    fn default() -> Self {
        FadeCurve::Quadratic
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
