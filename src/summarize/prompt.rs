use std::fmt::Write;

use crate::models::OcrSample;

/// Text sent to the summarizer: one block per sample, in batch order.
///
/// ```text
/// Application: <app>
/// Title: <title>
/// URL: <url>
/// <ocr text>
///
/// ```
pub fn build_payload(batch: &[OcrSample]) -> String {
    let mut text = String::new();

    for sample in batch {
        if let Some(app_name) = non_empty(&sample.app_name) {
            let _ = writeln!(text, "Application: {app_name}");
        }
        if let Some(title) = non_empty(&sample.title) {
            let _ = writeln!(text, "Title: {title}");
        }
        if let Some(url) = non_empty(&sample.url) {
            let _ = writeln!(text, "URL: {url}");
        }
        let _ = write!(text, "{}\n\n", sample.text);
    }

    text
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
