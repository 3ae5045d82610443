use serde::{Deserialize, Serialize};

/// A contiguous window of detected user activity, in host epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub start: f64,
    pub end: f64,
}

impl ActivityInterval {
    /// Zero-length interval opened by a single activity timestamp.
    pub fn at(timestamp: f64) -> Self {
        Self {
            start: timestamp,
            end: timestamp,
        }
    }

    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}
