use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::{
    activity::{ActivityLog, ActivityPresenter, WindowManager},
    capture::{OcrScheduler, OnDemandOutcome, SettleOutcome},
    clock::Clock,
    events::HostEvent,
    host_bridge::{CaptureProvider, Notifier, Summarizer, UiRenderer},
    locks::Locks,
    models::FrameMark,
    settings::ImmersionSettings,
    store::KvStore,
    summarize::{SingleflightGate, SummaryPipeline},
    tracking::IntervalTracker,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub const RECORDING_INACTIVE_NOTICE: &str = "Screen recording\nis not active!";

/// Host services the extension calls out to.
#[derive(Clone)]
pub struct HostBridges {
    pub capture: Arc<dyn CaptureProvider>,
    pub summarizer: Arc<dyn Summarizer>,
    pub renderer: Arc<dyn UiRenderer>,
    pub notifier: Arc<dyn Notifier>,
}

/// Routes host events to the tracker, the OCR scheduler and the activity window.
#[derive(Clone)]
pub struct ImmersionController {
    tracker: IntervalTracker,
    scheduler: OcrScheduler,
    presenter: ActivityPresenter,
    log: ActivityLog,
    notifier: Arc<dyn Notifier>,
}

impl ImmersionController {
    pub fn new(
        store: Arc<dyn KvStore>,
        bridges: HostBridges,
        clock: Arc<dyn Clock>,
        settings: &ImmersionSettings,
    ) -> Self {
        Self::with_locks(store, bridges, clock, Locks::new(), settings)
    }

    /// Build a controller that shares `locks` with earlier controllers over the same store.
    pub fn with_locks(
        store: Arc<dyn KvStore>,
        bridges: HostBridges,
        clock: Arc<dyn Clock>,
        locks: Arc<Locks>,
        settings: &ImmersionSettings,
    ) -> Self {
        let tracker = IntervalTracker::new(store.clone(), locks.clone(), settings.tracking.clone());
        let log = ActivityLog::new(store.clone());
        let windows = WindowManager::new(
            store.clone(),
            locks.clone(),
            bridges.renderer,
            settings.window.clone(),
        );
        let presenter =
            ActivityPresenter::new(store.clone(), log.clone(), windows, clock.clone());
        let gate = SingleflightGate::new(
            store.clone(),
            locks.clone(),
            clock.clone(),
            settings.summary.lease_secs,
        );
        let pipeline = SummaryPipeline::new(
            gate,
            bridges.summarizer,
            log.clone(),
            presenter.clone(),
            settings.summary.instructions.clone(),
        );
        let scheduler = OcrScheduler::new(
            store,
            locks,
            bridges.capture,
            clock,
            pipeline,
            settings.capture.clone(),
        );

        Self {
            tracker,
            scheduler,
            presenter,
            log,
            notifier: bridges.notifier,
        }
    }

    /// Called once per process before any event is dispatched.
    pub async fn startup(&self) -> Result<()> {
        self.presenter.windows().reset().await
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Entry point for the host bus. Errors are logged, never returned to the host.
    pub async fn handle_message(&self, channel: &str, event: &str, payload: &Value) {
        let decoded = match HostEvent::decode(channel, event, payload) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(err) => {
                log_error!("Dropping malformed {channel}/{event}: {err:?}");
                return;
            }
        };

        if let Err(err) = self.dispatch(decoded).await {
            log_error!("Handling {channel}/{event} failed: {err:?}");
        }
    }

    pub async fn dispatch(&self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::Launch => self.launch().await,
            HostEvent::PerformOcr => self.perform_ocr().await,
            HostEvent::WindowWillClose => self.presenter.windows().window_will_close().await,
            HostEvent::Input { timestamp, .. } => {
                self.handle_user_activity(timestamp).await?;
                Ok(())
            }
            HostEvent::FrameCaptured(frame) => self.record_frame(frame).await,
        }
    }

    pub async fn record_frame(&self, frame: FrameMark) -> Result<()> {
        self.tracker.record_frame(frame).await
    }

    /// Merge the input into the pending intervals and, if anything changed, try to
    /// settle the oldest one.
    pub async fn handle_user_activity(&self, timestamp: f64) -> Result<Option<SettleOutcome>> {
        match self.tracker.record_activity(timestamp).await? {
            Some(action) if action.mutated() => Ok(Some(self.scheduler.try_settle().await?)),
            _ => Ok(None),
        }
    }

    pub async fn launch(&self) -> Result<()> {
        self.presenter.render_activity().await?;
        Ok(())
    }

    pub async fn perform_ocr(&self) -> Result<()> {
        match self.scheduler.capture_recent().await? {
            OnDemandOutcome::RecordingInactive => {
                self.notifier
                    .show_notification(RECORDING_INACTIVE_NOTICE)
                    .await?;
            }
            OnDemandOutcome::Captured { interval, outcome } => {
                log_info!(
                    "On-demand OCR over {} - {} finished: {outcome:?}",
                    interval.start,
                    interval.end
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::CaptureOutcome,
        events::InputKind,
        host_bridge::SummaryResponse,
        models::ActivityInterval,
        store::{keys, MemoryStore},
        summarize::SummaryOutcome,
        testing::{FakeCapture, FakeNotifier, FakeRenderer, FakeSummarizer, FixedClock},
    };
    use serde_json::json;

    struct Harness {
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        capture: Arc<FakeCapture>,
        renderer: Arc<FakeRenderer>,
        notifier: Arc<FakeNotifier>,
        controller: ImmersionController,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = FixedClock::at(1_000.0);
        let capture = Arc::new(FakeCapture::echo());
        let renderer = Arc::new(FakeRenderer::new(42));
        let notifier = Arc::new(FakeNotifier::default());
        let bridges = HostBridges {
            capture: capture.clone(),
            summarizer: Arc::new(FakeSummarizer::replying(SummaryResponse {
                text: Some("Running the test suite".into()),
                cost: Some(0.0021),
            })),
            renderer: renderer.clone(),
            notifier: notifier.clone(),
        };
        let controller = ImmersionController::new(
            store.clone(),
            bridges,
            clock.clone(),
            &ImmersionSettings::default(),
        );

        Harness {
            store,
            clock,
            capture,
            renderer,
            notifier,
            controller,
        }
    }

    #[tokio::test]
    async fn launch_renders_activity_window() {
        let h = harness();
        h.controller
            .handle_message("messages", "launch", &json!({}))
            .await;

        let requests = h.renderer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].template, "activity.html");
        assert_eq!(requests[0].window_id, None);
        assert_eq!(h.store.get(keys::WINDOW_ID).await.unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn startup_forgets_previous_window() {
        let h = harness();
        h.store.set(keys::WINDOW_ID, "7").await.unwrap();

        h.controller.startup().await.unwrap();

        assert_eq!(h.store.get(keys::WINDOW_ID).await.unwrap(), None);
    }

    #[tokio::test]
    async fn perform_ocr_without_recording_notifies() {
        let h = harness();
        h.controller
            .handle_message("messages", "performOCR", &json!({}))
            .await;

        assert_eq!(h.notifier.shown(), vec![RECORDING_INACTIVE_NOTICE.to_string()]);
        assert!(h.capture.requests().is_empty());
    }

    #[tokio::test]
    async fn perform_ocr_summarizes_last_minute() {
        let h = harness();
        h.controller
            .record_frame(FrameMark { timestamp: 990.0 })
            .await
            .unwrap();

        h.controller.perform_ocr().await.unwrap();

        assert!(h.notifier.shown().is_empty());
        assert_eq!(h.capture.requests().len(), 5);
        let entries = h.controller.activity_log().entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].summary, "Running the test suite");
        assert_eq!(entries[0].cost, "0.002");
    }

    #[tokio::test]
    async fn settled_interval_is_summarized_and_rendered() {
        let h = harness();
        h.controller
            .handle_message("recorder", "didCaptureFrame", &json!({"timestamp": 1000.0}))
            .await;
        h.controller
            .handle_message("system", "leftMouseUp", &json!({"timestamp": 1005.0}))
            .await;

        h.clock.set(1_050.0);
        let outcome = h.controller.handle_user_activity(1_010.0).await.unwrap();

        match outcome {
            Some(SettleOutcome::Captured { interval, outcome }) => {
                assert_eq!(interval, ActivityInterval::new(1_005.0, 1_010.0));
                assert!(matches!(
                    outcome,
                    CaptureOutcome::Summarized(SummaryOutcome::Appended(_))
                ));
            }
            other => panic!("expected a captured interval, got {other:?}"),
        }
        assert_eq!(h.capture.requests(), vec![1_007.5]);
        assert_eq!(h.renderer.requests().len(), 1);
    }

    #[tokio::test]
    async fn closed_window_is_not_rerendered_by_new_summaries() {
        let h = harness();
        h.controller.launch().await.unwrap();
        h.controller
            .handle_message("messages", "windowWillClose", &json!({}))
            .await;

        h.controller
            .record_frame(FrameMark { timestamp: 1_000.0 })
            .await
            .unwrap();
        h.controller.perform_ocr().await.unwrap();

        assert_eq!(h.controller.activity_log().entries().await.unwrap().len(), 1);
        assert_eq!(h.renderer.requests().len(), 1);
        assert_eq!(h.store.get(keys::WINDOW_ID).await.unwrap(), None);
    }

    #[tokio::test]
    async fn activity_without_recent_frame_is_ignored() {
        let h = harness();
        let outcome = h.controller.handle_user_activity(1_000.0).await.unwrap();

        assert_eq!(outcome, None);
        assert!(h.capture.requests().is_empty());
    }

    #[tokio::test]
    async fn dispatched_input_extends_pending_interval() {
        let h = harness();
        h.controller
            .dispatch(HostEvent::FrameCaptured(FrameMark { timestamp: 995.0 }))
            .await
            .unwrap();

        for (kind, timestamp) in [(InputKind::KeyUp, 1_000.0), (InputKind::Scroll, 1_004.0)] {
            h.controller
                .dispatch(HostEvent::Input { kind, timestamp })
                .await
                .unwrap();
        }

        let intervals: Vec<ActivityInterval> =
            crate::store::get_json(h.store.as_ref(), keys::ACTIVITY_INTERVALS)
                .await
                .unwrap()
                .unwrap();
        assert_eq!(intervals, vec![ActivityInterval::new(1_000.0, 1_004.0)]);
        assert!(h.capture.requests().is_empty());
    }
}
