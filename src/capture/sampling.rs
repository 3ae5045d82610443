use crate::{host_bridge::FrameOcr, models::ActivityInterval, models::OcrSample};

use super::config::CaptureConfig;

/// Why a frame was left out of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NoFrame,
    EmptyText,
    MissingTimestamp,
    Stale { drift_secs: f64 },
}

/// `min(max_samples, floor(duration / spacing) + 1)`
pub fn sample_count(interval: &ActivityInterval, config: &CaptureConfig) -> usize {
    let duration = interval.duration_secs().max(0.0);
    let by_duration = ((duration / config.sample_spacing_secs).floor() as usize).saturating_add(1);
    by_duration.min(config.max_samples)
}

/// Midpoints of `n` equal slices of the interval.
pub fn sample_points(interval: &ActivityInterval, config: &CaptureConfig) -> Vec<f64> {
    let n = sample_count(interval, config);
    let step = interval.duration_secs() / n as f64;
    (0..n)
        .map(|i| interval.start + step * (i as f64 + 0.5))
        .collect()
}

pub fn accept_frame(
    frame: Option<FrameOcr>,
    requested: f64,
    config: &CaptureConfig,
) -> Result<OcrSample, Rejection> {
    let frame = frame.ok_or(Rejection::NoFrame)?;

    let text = match frame.text {
        Some(text) if !text.is_empty() => text,
        _ => return Err(Rejection::EmptyText),
    };

    let reported = frame.timestamp.ok_or(Rejection::MissingTimestamp)?;
    let drift_secs = (reported - requested).abs();
    if drift_secs > config.max_drift_secs {
        return Err(Rejection::Stale { drift_secs });
    }

    Ok(OcrSample {
        id: reported as i64,
        timestamp: reported,
        app_name: frame.app_name,
        bundle_id: frame.bundle_id,
        text,
        title: frame.title,
        url: frame.url,
    })
}
