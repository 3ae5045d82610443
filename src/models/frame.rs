use serde::{Deserialize, Serialize};

/// Marker for the most recently captured screen frame.
///
/// Persisted on every `didCaptureFrame`; its age decides whether recording is live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMark {
    pub timestamp: f64,
}
