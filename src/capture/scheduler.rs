use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    clock::Clock,
    host_bridge::CaptureProvider,
    locks::Locks,
    models::{ActivityInterval, FrameMark, PendingBatch},
    store::{get_json, keys, update_json, KvStore},
    summarize::{SummaryOutcome, SummaryPipeline},
};

use super::{
    config::CaptureConfig,
    sampling::{accept_frame, sample_points, Rejection},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// No sample passed the filters; the interval was dropped.
    NoSamples,
    Summarized(SummaryOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    NothingPending,
    /// The oldest interval may still be extended.
    Deferred { oldest: ActivityInterval },
    Captured {
        interval: ActivityInterval,
        outcome: CaptureOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnDemandOutcome {
    RecordingInactive,
    Captured {
        interval: ActivityInterval,
        outcome: CaptureOutcome,
    },
}

enum SettlePoll {
    Empty,
    Deferred(ActivityInterval),
    Ready(ActivityInterval),
}

#[derive(Clone)]
pub struct OcrScheduler {
    store: Arc<dyn KvStore>,
    locks: Arc<Locks>,
    capture: Arc<dyn CaptureProvider>,
    clock: Arc<dyn Clock>,
    pipeline: SummaryPipeline,
    config: CaptureConfig,
}

impl OcrScheduler {
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: Arc<Locks>,
        capture: Arc<dyn CaptureProvider>,
        clock: Arc<dyn Clock>,
        pipeline: SummaryPipeline,
        config: CaptureConfig,
    ) -> Self {
        Self {
            store,
            locks,
            capture,
            clock,
            pipeline,
            config,
        }
    }

    /// Pop and capture the oldest interval once it has settled.
    pub async fn try_settle(&self) -> Result<SettleOutcome> {
        let now = self.clock.now();
        let settle_secs = self.config.settle_secs;

        let poll = {
            let _guard = self.locks.intervals.lock().await;
            update_json(
                self.store.as_ref(),
                keys::ACTIVITY_INTERVALS,
                move |intervals: Option<Vec<ActivityInterval>>| {
                    let Some(mut intervals) = intervals else {
                        return Ok((None, SettlePoll::Empty));
                    };
                    let poll = match intervals.first().copied() {
                        None => SettlePoll::Empty,
                        Some(oldest) if now - oldest.end < settle_secs => {
                            SettlePoll::Deferred(oldest)
                        }
                        Some(oldest) => {
                            intervals.remove(0);
                            SettlePoll::Ready(oldest)
                        }
                    };
                    Ok((Some(intervals), poll))
                },
            )
            .await
            .context("failed to poll activity intervals")?
        };

        match poll {
            SettlePoll::Empty => Ok(SettleOutcome::NothingPending),
            SettlePoll::Deferred(oldest) => Ok(SettleOutcome::Deferred { oldest }),
            SettlePoll::Ready(interval) => {
                let outcome = self.capture_interval(interval).await?;
                Ok(SettleOutcome::Captured { interval, outcome })
            }
        }
    }

    /// Capture the window leading up to the last frame, outside the interval queue.
    pub async fn capture_recent(&self) -> Result<OnDemandOutcome> {
        let last_frame: Option<FrameMark> = get_json(self.store.as_ref(), keys::LAST_FRAME).await?;
        let now = self.clock.now();

        let Some(frame) = last_frame.filter(|frame| {
            now - frame.timestamp <= self.config.on_demand_freshness_secs
        }) else {
            log_info!("On-demand OCR requested but recording is not running");
            return Ok(OnDemandOutcome::RecordingInactive);
        };

        let interval = ActivityInterval::new(
            frame.timestamp - self.config.on_demand_window_secs,
            frame.timestamp,
        );
        let outcome = self.capture_interval(interval).await?;
        Ok(OnDemandOutcome::Captured { interval, outcome })
    }

    pub async fn capture_interval(&self, interval: ActivityInterval) -> Result<CaptureOutcome> {
        log_info!("OCR triggered: {} - {}", interval.start, interval.end);

        let batch = {
            let _guard = self.locks.capture.lock().await;
            self.collect_samples(&interval).await
        };

        if batch.is_empty() {
            log_info!("No OCR results, skipping activity interval");
            return Ok(CaptureOutcome::NoSamples);
        }

        log_info!("Got {} OCR results, handing batch to summarizer", batch.len());
        let outcome = self.pipeline.summarize(batch).await?;
        Ok(CaptureOutcome::Summarized(outcome))
    }

    async fn collect_samples(&self, interval: &ActivityInterval) -> PendingBatch {
        let mut batch = PendingBatch::new();

        for requested in sample_points(interval, &self.config) {
            let frame = match self.capture.frame_ocr(requested).await {
                Ok(frame) => frame,
                Err(err) => {
                    log_warn!("OCR request at {requested} failed: {err:?}");
                    continue;
                }
            };

            let icon = frame.as_ref().and_then(|frame| frame.app_icon.clone());

            match accept_frame(frame, requested, &self.config) {
                Ok(sample) => {
                    if let (Some(bundle_id), Some(icon)) = (&sample.bundle_id, icon) {
                        self.cache_icon(bundle_id, &icon).await;
                    }
                    batch.push(sample);
                }
                Err(Rejection::Stale { drift_secs }) => {
                    log_info!("Got irrelevant OCR result {drift_secs:.1}s away from {requested}");
                }
                Err(rejection) => {
                    log_info!("Got unusable OCR result at {requested}: {rejection:?}");
                }
            }
        }

        batch
    }

    async fn cache_icon(&self, bundle_id: &str, icon: &str) {
        if let Err(err) = self.store.set(&keys::bundle_icon(bundle_id), icon).await {
            log_warn!("Failed to cache icon for {bundle_id}: {err:?}");
        }
    }
}
