use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTRUCTIONS: &str = "Some OCR data from one or more user opened windows will be provided, including application names, optional window titles and optional visited URLs for browser windows. Identify the context on what the user is currently working on and generate a short summary in one impersonal sentence without subject. The result should be a formatted string with line breaks inserted so that there's no more than 35 letters in each line.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub instructions: String,

    /// A running flag older than this is treated as left behind by a dead process
    pub lease_secs: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            lease_secs: 300.0,
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.instructions.trim().is_empty(),
            "summary instructions must not be empty"
        );
        ensure!(
            self.lease_secs > 0.0,
            "lease_secs must be positive, got {}",
            self.lease_secs
        );
        Ok(())
    }
}
