/*!
Post-move slope classification.

After the move primitive ran, the actual displacement is compared with the desired one:

- rising: the slope of the actual displacement decides between walkable ground, a steep
  but climbable slope and a step-or-wall candidate (handed to `step::StepClimber`);
- flat: walkable ground;
- descending: if the primitive let the whole displacement through the avatar is in free
  fall, otherwise the surface truncated it and its slope decides between walking down
  and sliding.
*/

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SLOPE_LIMIT_DEG, DEFAULT_MIN_SLOPE_LIMIT_DEG};
use crate::error::{ControllerError, Result};
use crate::types::Vec3;
use crate::utils::{vectors_equal, vertical_slope};

/// Result of classifying one frame's actual displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlopeClass {
    /// Flat, or rising below the lower limit.
    Ground,
    /// Rising between the limits.
    Steep,
    /// Rising at or above the upper limit.
    StepOrWall,
    /// Descending exactly as desired.
    FreeFall,
    /// Descending, truncated by a surface no steeper than the lower limit.
    WalkDown,
    /// Descending, truncated by a surface steeper than the lower limit.
    Sliding,
}

/// Lower and upper slope limits, stored in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlopeLimits {
    lower: f32,
    upper: f32,
}

impl Default for SlopeLimits {
    fn default() -> Self {
        Self {
            lower: DEFAULT_MIN_SLOPE_LIMIT_DEG.to_radians(),
            upper: DEFAULT_MAX_SLOPE_LIMIT_DEG.to_radians(),
        }
    }
}

impl SlopeLimits {
    pub fn from_degrees(min: f32, max: f32) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
            return Err(ControllerError::InvalidSlopeLimits { min, max });
        }
        Ok(Self {
            lower: min.to_radians(),
            upper: max.to_radians(),
        })
    }

    #[inline]
    pub fn lower(&self) -> f32 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> f32 {
        self.upper
    }

    pub fn min_degrees(&self) -> f32 {
        self.lower.to_degrees()
    }

    pub fn max_degrees(&self) -> f32 {
        self.upper.to_degrees()
    }

    /// Classify a rise by its slope angle (radians).
    pub fn classify_rise(&self, angle: f32) -> SlopeClass {
        if angle >= self.upper {
            SlopeClass::StepOrWall
        } else if angle >= self.lower {
            SlopeClass::Steep
        } else {
            SlopeClass::Ground
        }
    }

    /// Classify a truncated descent by its slope angle (radians).
    pub fn classify_descent(&self, angle: f32) -> SlopeClass {
        if angle <= self.lower {
            SlopeClass::WalkDown
        } else {
            SlopeClass::Sliding
        }
    }

    /// Classify `actual` against the `desired` displacement.
    pub fn classify(&self, actual: &Vec3, desired: &Vec3, epsilon: f32) -> SlopeClass {
        if actual.y > 0.0 {
            self.classify_rise(vertical_slope(actual))
        } else if actual.y < 0.0 {
            if vectors_equal(actual, desired, epsilon) {
                SlopeClass::FreeFall
            } else {
                self.classify_descent(vertical_slope(actual))
            }
        } else {
            SlopeClass::Ground
        }
    }
}
