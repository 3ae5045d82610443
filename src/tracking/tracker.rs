use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    locks::Locks,
    models::{ActivityInterval, FrameMark},
    store::{get_json, keys, set_json, update_json, KvStore},
};

use super::config::TrackingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// A new interval was opened at the timestamp.
    Started,
    /// The last interval now ends at the timestamp.
    Extended,
    /// The timestamp falls inside the last interval; nothing changed.
    Covered,
}

impl MergeAction {
    pub fn mutated(self) -> bool {
        !matches!(self, MergeAction::Covered)
    }
}

/// Fold one activity timestamp into the interval list.
///
/// Only the last interval is ever extended. Intervals stay disjoint and no interval
/// spans more than `max_interval_span_secs`.
pub fn merge_activity(
    intervals: &mut Vec<ActivityInterval>,
    timestamp: f64,
    config: &TrackingConfig,
) -> MergeAction {
    let Some(last) = intervals.last_mut() else {
        intervals.push(ActivityInterval::at(timestamp));
        return MergeAction::Started;
    };

    if timestamp <= last.end {
        return MergeAction::Covered;
    }

    let too_long = last.duration_secs() > config.max_interval_span_secs;
    let too_old = timestamp - last.start > config.max_interval_age_secs;
    let gap_too_large = timestamp - last.end > config.max_gap_secs;
    let would_overflow = timestamp - last.start > config.max_interval_span_secs;

    if too_long || too_old || gap_too_large || would_overflow {
        intervals.push(ActivityInterval::at(timestamp));
        MergeAction::Started
    } else {
        last.end = timestamp;
        MergeAction::Extended
    }
}

/// Persists the interval list and the recording heartbeat it depends on.
#[derive(Clone)]
pub struct IntervalTracker {
    store: Arc<dyn KvStore>,
    locks: Arc<Locks>,
    config: TrackingConfig,
}

impl IntervalTracker {
    pub fn new(store: Arc<dyn KvStore>, locks: Arc<Locks>, config: TrackingConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    pub async fn record_frame(&self, frame: FrameMark) -> Result<()> {
        set_json(self.store.as_ref(), keys::LAST_FRAME, &frame)
            .await
            .context("failed to persist last frame")
    }

    pub async fn last_frame(&self) -> Result<Option<FrameMark>> {
        get_json(self.store.as_ref(), keys::LAST_FRAME).await
    }

    /// Merge an input event into the persisted interval list.
    ///
    /// Returns `None` when recording is not live at `timestamp`; the list is untouched.
    pub async fn record_activity(&self, timestamp: f64) -> Result<Option<MergeAction>> {
        let live = match self.last_frame().await? {
            Some(frame) => timestamp - frame.timestamp <= self.config.recording_liveness_secs,
            None => false,
        };
        if !live {
            log::debug!("Ignoring activity at {timestamp}: recording is not active");
            return Ok(None);
        }

        let _guard = self.locks.intervals.lock().await;
        let config = self.config.clone();
        let action = update_json(
            self.store.as_ref(),
            keys::ACTIVITY_INTERVALS,
            move |intervals: Option<Vec<ActivityInterval>>| {
                let mut intervals = intervals.unwrap_or_default();
                let action = merge_activity(&mut intervals, timestamp, &config);
                Ok((Some(intervals), action))
            },
        )
        .await
        .context("failed to update activity intervals")?;

        if action == MergeAction::Started {
            log::debug!("Opened activity interval at {timestamp}");
        }

        Ok(Some(action))
    }

    pub async fn pending_intervals(&self) -> Result<Vec<ActivityInterval>> {
        Ok(get_json(self.store.as_ref(), keys::ACTIVITY_INTERVALS)
            .await?
            .unwrap_or_default())
    }
}
