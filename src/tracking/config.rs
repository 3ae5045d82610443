use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Thresholds that decide when activity extends an interval and when it opens a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Activity is ignored unless a frame was captured at most this long before it
    pub recording_liveness_secs: f64,

    /// Longest span an interval may cover
    pub max_interval_span_secs: f64,

    /// Activity this long after an interval's start never joins it
    pub max_interval_age_secs: f64,

    /// Longest pause that still counts as continuous attention
    pub max_gap_secs: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            recording_liveness_secs: 15.0,
            max_interval_span_secs: 90.0,
            max_interval_age_secs: 100.0,
            max_gap_secs: 20.0,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("recording_liveness_secs", self.recording_liveness_secs),
            ("max_interval_span_secs", self.max_interval_span_secs),
            ("max_interval_age_secs", self.max_interval_age_secs),
            ("max_gap_secs", self.max_gap_secs),
        ] {
            ensure!(value >= 0.0, "{name} must not be negative, got {value}");
        }
        Ok(())
    }
}
