use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Tunables for interval settlement and OCR sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// An interval untouched for this long is considered settled
    pub settle_secs: f64,

    /// One sample per this many seconds of interval duration
    pub sample_spacing_secs: f64,

    pub max_samples: usize,

    /// Reported frame time may differ from the requested one by at most this much
    pub max_drift_secs: f64,

    /// On-demand capture covers this many seconds before the last frame
    pub on_demand_window_secs: f64,

    /// On-demand capture requires a frame at most this old
    pub on_demand_freshness_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_secs: 30.0,
            sample_spacing_secs: 15.0,
            max_samples: 5,
            max_drift_secs: 10.0,
            on_demand_window_secs: 60.0,
            on_demand_freshness_secs: 30.0,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.sample_spacing_secs.is_finite() && self.sample_spacing_secs > 0.0,
            "sample_spacing_secs must be positive, got {}",
            self.sample_spacing_secs
        );
        ensure!(self.max_samples > 0, "max_samples must be at least 1");
        for (name, value) in [
            ("settle_secs", self.settle_secs),
            ("max_drift_secs", self.max_drift_secs),
            ("on_demand_window_secs", self.on_demand_window_secs),
            ("on_demand_freshness_secs", self.on_demand_freshness_secs),
        ] {
            ensure!(value >= 0.0, "{name} must not be negative, got {value}");
        }
        Ok(())
    }
}
