//! Host bus messages this extension subscribes to.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::models::FrameMark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    MouseUp,
    KeyUp,
    Scroll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// "Activity Log" launcher.
    Launch,
    /// "Perform OCR" launcher.
    PerformOcr,
    WindowWillClose,
    Input { kind: InputKind, timestamp: f64 },
    FrameCaptured(FrameMark),
}

#[derive(Deserialize)]
struct TimestampPayload {
    timestamp: f64,
}

impl HostEvent {
    /// Decode a `(channel, event, payload)` triple; `Ok(None)` for events we ignore.
    pub fn decode(channel: &str, event: &str, payload: &Value) -> Result<Option<Self>> {
        let decoded = match (channel, event) {
            ("messages", "launch") => Self::Launch,
            ("messages", "performOCR") => Self::PerformOcr,
            ("messages", "windowWillClose") => Self::WindowWillClose,
            ("system", "leftMouseUp") => Self::input(InputKind::MouseUp, event, payload)?,
            ("system", "keyUp") => Self::input(InputKind::KeyUp, event, payload)?,
            ("system", "scrollWheel") => Self::input(InputKind::Scroll, event, payload)?,
            ("recorder", "didCaptureFrame") => Self::FrameCaptured(
                serde_json::from_value(payload.clone())
                    .context("didCaptureFrame payload has no usable timestamp")?,
            ),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    fn input(kind: InputKind, event: &str, payload: &Value) -> Result<Self> {
        let TimestampPayload { timestamp } = serde_json::from_value(payload.clone())
            .with_context(|| format!("{event} payload has no usable timestamp"))?;
        Ok(Self::Input { kind, timestamp })
    }
}
