//! View model handed to the host's activity template.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::ActivitySummaryEntry;

pub const TODAY: &str = "Today";

/// One log entry plus its derived local date and time labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    #[serde(flatten)]
    pub entry: ActivitySummaryEntry,
    pub day: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub entries: Vec<ActivityRow>,
    /// Distinct day labels in log order, one per section header.
    pub day_labels: Vec<String>,
    pub icon: String,
    pub daily_cost: f64,
    pub daily_cost_label: String,
}

fn local_datetime(timestamp: f64) -> Option<DateTime<Local>> {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos).map(|dt| dt.with_timezone(&Local))
}

/// `"Today"` for the current local date, the locale date string otherwise.
pub fn day_label(timestamp: f64, now: f64) -> String {
    match (local_datetime(timestamp), local_datetime(now)) {
        (Some(at), Some(today)) if at.date_naive() == today.date_naive() => TODAY.to_string(),
        (Some(at), _) => at.format("%x").to_string(),
        (None, _) => "Unknown".to_string(),
    }
}

pub fn time_label(timestamp: f64) -> String {
    local_datetime(timestamp)
        .map(|at| at.format("%X").to_string())
        .unwrap_or_default()
}

/// Sum of parseable costs of every row sharing the last row's day.
pub fn daily_cost(rows: &[ActivityRow]) -> f64 {
    let Some(last) = rows.last() else {
        return 0.0;
    };

    rows.iter()
        .filter(|row| row.day == last.day)
        .filter_map(|row| {
            let cost = row.entry.cost_value();
            if cost.is_none() {
                log::debug!(
                    "Skipping unparseable cost {:?} of entry at {}",
                    row.entry.cost,
                    row.entry.timestamp
                );
            }
            cost
        })
        .sum()
}

pub fn build_view(entries: Vec<ActivitySummaryEntry>, now: f64, icon: String) -> ActivityView {
    let mut day_labels: Vec<String> = Vec::new();
    let rows: Vec<ActivityRow> = entries
        .into_iter()
        .map(|entry| {
            let day = day_label(entry.timestamp, now);
            if day_labels.last() != Some(&day) {
                day_labels.push(day.clone());
            }
            ActivityRow {
                time: time_label(entry.timestamp),
                day,
                entry,
            }
        })
        .collect();

    let daily_cost = daily_cost(&rows);

    ActivityView {
        entries: rows,
        day_labels,
        icon,
        daily_cost,
        daily_cost_label: ActivitySummaryEntry::format_cost(daily_cost),
    }
}

/// Base64 of the bundled fallback application icon.
pub fn default_icon() -> String {
    STANDARD.encode(include_bytes!("../../assets/default_icon.svg"))
}
