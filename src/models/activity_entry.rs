//! Activity log entry data model.
//!
//! One entry is appended per summarized batch and never rewritten afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummaryEntry {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub bundle_id: Option<String>,
    pub timestamp: f64,
    pub summary: String,
    /// Decimal string such as `"0.012"`. Older entries may carry a bare number.
    #[serde(default, deserialize_with = "lenient_cost")]
    pub cost: String,
}

impl ActivitySummaryEntry {
    pub fn format_cost(cost: f64) -> String {
        format!("{cost:.3}")
    }

    /// Parsed cost, `None` when the stored value is not a finite number.
    pub fn cost_value(&self) -> Option<f64> {
        self.cost
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

fn lenient_cost<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(raw) => raw,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
