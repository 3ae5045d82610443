use serde::{Deserialize, Serialize};

/// One accepted OCR reading taken at a sampling point of an interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrSample {
    pub id: i64,
    pub timestamp: f64,
    pub app_name: Option<String>,
    pub bundle_id: Option<String>,
    pub text: String,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Accepted samples of one interval, in chronological order.
pub type PendingBatch = Vec<OcrSample>;
