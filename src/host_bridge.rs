//! Contracts of the host-provided services this extension talks to.
//!
//! Each trait is one request/response round trip over the host message bus. The bus
//! itself (transport, correlation ids, timeouts) belongs to the host; implementations
//! of these traits wrap it.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply to `recorder.getFrameOCR`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOcr {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default, rename = "bundleID")]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Base64 application icon.
    #[serde(default)]
    pub app_icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub instructions: String,
    pub text: String,
}

/// Reply to `ai.query`. A reply without `text` is malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

pub type WindowId = i64;

/// Payload of `ui.renderHTML`. The host owns the template named by `template`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub template: String,
    pub view: Value,
    pub width: u32,
    pub height: u32,
    pub reopen: bool,
    pub window_tag: String,
    #[serde(rename = "windowID", skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
}

#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// OCR of the frame closest to `timestamp`, `None` when nothing was recorded.
    async fn frame_ocr(&self, timestamp: f64) -> Result<Option<FrameOcr>>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn query(&self, request: SummaryRequest) -> Result<SummaryResponse>;
}

#[async_trait]
pub trait UiRenderer: Send + Sync {
    /// Render into `request.window_id` when given, otherwise open a new window.
    async fn render(&self, request: RenderRequest) -> Result<WindowId>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show_notification(&self, text: &str) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ocr_reads_host_field_names() {
        let frame: FrameOcr = serde_json::from_str(
            r#"{"text": "hello", "timestamp": 12.5, "appName": "Safari",
                "bundleID": "com.apple.Safari", "url": "https://example.com",
                "appIcon": "iVBOR"}"#,
        )
        .unwrap();

        assert_eq!(frame.bundle_id.as_deref(), Some("com.apple.Safari"));
        assert_eq!(frame.app_icon.as_deref(), Some("iVBOR"));
        assert_eq!(frame.title, None);
    }

    #[test]
    fn render_request_omits_missing_window() {
        let request = RenderRequest {
            template: "activity.html".into(),
            view: Value::Null,
            width: 420,
            height: 600,
            reopen: true,
            window_tag: "main".into(),
            window_id: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("windowID").is_none());
        assert_eq!(json["windowTag"], "main");
    }
}
