//! Monitor configuration types
//!
//! Thresholds for the tire pressure heuristic and the cadence of the snapshot
//! emitter. Every field has a default, so an empty TOML table or
//! `MonitorConfig::new()` gives a working monitor.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the decoding engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Steering angle (degrees) above which the vehicle counts as cornering
    #[serde(default = "default_steering_limit")]
    pub steering_limit_deg: i32,

    /// Counter value above which a corner raises a pressure advisory
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: i32,

    /// Relative wheel speed difference that counts as a skew
    #[serde(default = "default_skew_ratio")]
    pub skew_ratio: f64,

    /// Non-triggering samples per decrement once a corner has alerted
    #[serde(default = "default_cautious_decay_interval")]
    pub cautious_decay_interval: u32,

    /// Emit a snapshot every N routed frames
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: usize,

    /// Maximum number of distinct unknown identifiers remembered
    #[serde(default = "default_unknown_capacity")]
    pub unknown_capacity: usize,
}

fn default_steering_limit() -> i32 {
    10
}

fn default_alert_threshold() -> i32 {
    25
}

fn default_skew_ratio() -> f64 {
    0.02
}

fn default_cautious_decay_interval() -> u32 {
    10
}

fn default_snapshot_interval() -> usize {
    5
}

fn default_unknown_capacity() -> usize {
    1024
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            steering_limit_deg: default_steering_limit(),
            alert_threshold: default_alert_threshold(),
            skew_ratio: default_skew_ratio(),
            cautious_decay_interval: default_cautious_decay_interval(),
            snapshot_interval: default_snapshot_interval(),
            unknown_capacity: default_unknown_capacity(),
        }
    }
}

impl MonitorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the cornering limit in degrees
    pub fn with_steering_limit(mut self, degrees: i32) -> Self {
        self.steering_limit_deg = degrees;
        self
    }

    /// Builder method: set the advisory threshold
    pub fn with_alert_threshold(mut self, threshold: i32) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// Builder method: set the relative skew trigger
    pub fn with_skew_ratio(mut self, ratio: f64) -> Self {
        self.skew_ratio = ratio;
        self
    }

    /// Builder method: set the cautious-regime decay interval
    pub fn with_cautious_decay_interval(mut self, samples: u32) -> Self {
        self.cautious_decay_interval = samples;
        self
    }

    /// Builder method: set the snapshot cadence
    pub fn with_snapshot_interval(mut self, frames: usize) -> Self {
        self.snapshot_interval = frames;
        self
    }

    /// Builder method: set the unknown identifier capacity
    pub fn with_unknown_capacity(mut self, capacity: usize) -> Self {
        self.unknown_capacity = capacity;
        self
    }

    /// Squared cornering limit, compared against the squared steering angle
    pub fn steering_limit_squared(&self) -> i64 {
        let limit = i64::from(self.steering_limit_deg);
        limit * limit
    }

    /// Check that the values describe a usable monitor
    pub fn validate(&self) -> Result<()> {
        if self.steering_limit_deg < 0 {
            return Err(DecoderError::InvalidConfig(format!(
                "steering_limit_deg must not be negative (got {})",
                self.steering_limit_deg
            )));
        }
        if self.alert_threshold < 0 {
            return Err(DecoderError::InvalidConfig(format!(
                "alert_threshold must not be negative (got {})",
                self.alert_threshold
            )));
        }
        if !(self.skew_ratio > 0.0 && self.skew_ratio.is_finite()) {
            return Err(DecoderError::InvalidConfig(format!(
                "skew_ratio must be a positive number (got {})",
                self.skew_ratio
            )));
        }
        if self.cautious_decay_interval == 0 {
            return Err(DecoderError::InvalidConfig(
                "cautious_decay_interval must be at least 1".to_string(),
            ));
        }
        if self.snapshot_interval == 0 {
            return Err(DecoderError::InvalidConfig(
                "snapshot_interval must be at least 1".to_string(),
            ));
        }
        if self.unknown_capacity == 0 {
            return Err(DecoderError::InvalidConfig(
                "unknown_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
