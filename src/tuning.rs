//! Player-feel tuning
//!
//! Loaded from JSON by the host; missing fields fall back to `crate::consts`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning data
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("Malformed tuning data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Per-game movement parameters (all in pixels per tick)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Added to x-velocity while left/right is held
    pub horizontal_accel: i32,
    /// Removed from |x-velocity| every tick
    pub friction: i32,
    /// Added to y-velocity every airborne tick
    pub gravity: i32,
    /// Y-velocity set by a jump (negative is up)
    pub jump_velocity: i32,
    /// Y-velocity a rising body is clamped to once jump is released
    pub jump_cap: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            horizontal_accel: HORIZONTAL_ACCEL,
            friction: FRICTION,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            jump_cap: JUMP_CAP,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot honor
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.horizontal_accel < 0 {
            return Err(TuningError::Invalid {
                field: "horizontal_accel",
                reason: format!("must not be negative (got {})", self.horizontal_accel),
            });
        }
        if self.friction < 0 {
            return Err(TuningError::Invalid {
                field: "friction",
                reason: format!("must not be negative (got {})", self.friction),
            });
        }
        if self.gravity < 0 || self.gravity > MAX_Y_VELOCITY {
            return Err(TuningError::Invalid {
                field: "gravity",
                reason: format!("must be within 0..={MAX_Y_VELOCITY} (got {})", self.gravity),
            });
        }
        if self.jump_velocity >= 0 || self.jump_velocity < -MAX_Y_VELOCITY {
            return Err(TuningError::Invalid {
                field: "jump_velocity",
                reason: format!(
                    "must be upward and within the velocity cap (got {})",
                    self.jump_velocity
                ),
            });
        }
        if self.jump_cap > 0 || self.jump_cap < self.jump_velocity {
            return Err(TuningError::Invalid {
                field: "jump_cap",
                reason: format!(
                    "must lie between jump_velocity ({}) and 0 (got {})",
                    self.jump_velocity, self.jump_cap
                ),
            });
        }
        Ok(())
    }
}
