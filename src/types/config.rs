//! Authority-side tuning, static for the session

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_RELAY_HZ, DEFAULT_SQUEEZE_RATIO,
    DEFAULT_STALE_WINDOW_SECS, DEFAULT_SUSTAIN_SECS,
};

/// Invalid tuning values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("squeeze_ratio must be in (0, 1), got {0}")]
    SqueezeRatio(f32),
    #[error("sustain_time must be >= 0, got {0}")]
    SustainTime(f32),
    #[error("cooldown must be >= 0, got {0}")]
    Cooldown(f32),
    #[error("stale_window must be > 0, got {0}")]
    StaleWindow(f32),
    #[error("relay_hz must be > 0, got {0}")]
    RelayHz(f32),
}

/// Squeeze detection tuning.
///
/// The threshold is NOT an absolute distance: it is a fraction of the rest
/// distance captured when both sides first become valid, so the gesture is
/// measured relative to the grip's own resting width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeConfig {
    /// Compressed when current distance <= rest distance × this ratio, in (0,1)
    pub squeeze_ratio: f32,
    /// Continuous compression required before a trigger (seconds)
    pub sustain_time: f32,
    /// Minimum interval between triggers (seconds)
    pub cooldown: f32,
    /// Maximum age of a position sample before it is ignored (seconds)
    pub stale_window: f32,
    /// Reporter sample cadence (Hz)
    pub relay_hz: f32,
}

impl Default for SqueezeConfig {
    fn default() -> Self {
        Self {
            squeeze_ratio: DEFAULT_SQUEEZE_RATIO,
            sustain_time: DEFAULT_SUSTAIN_SECS,
            cooldown: DEFAULT_COOLDOWN_SECS,
            stale_window: DEFAULT_STALE_WINDOW_SECS,
            relay_hz: DEFAULT_RELAY_HZ,
        }
    }
}

impl SqueezeConfig {
    /// Validate all fields, first failure wins
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.squeeze_ratio > 0.0 && self.squeeze_ratio < 1.0) {
            return Err(ConfigError::SqueezeRatio(self.squeeze_ratio));
        }
        if self.sustain_time < 0.0 {
            return Err(ConfigError::SustainTime(self.sustain_time));
        }
        if self.cooldown < 0.0 {
            return Err(ConfigError::Cooldown(self.cooldown));
        }
        if self.stale_window <= 0.0 {
            return Err(ConfigError::StaleWindow(self.stale_window));
        }
        if self.relay_hz <= 0.0 {
            return Err(ConfigError::RelayHz(self.relay_hz));
        }
        Ok(())
    }

    /// Seconds between reporter samples
    pub fn relay_interval_secs(&self) -> f32 {
        1.0 / self.relay_hz
    }
}
