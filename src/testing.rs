//! In-memory stand-ins for the host services, shared by unit tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::{
    clock::Clock,
    host_bridge::{
        CaptureProvider, FrameOcr, Notifier, RenderRequest, SummaryRequest, SummaryResponse,
        Summarizer, UiRenderer, WindowId,
    },
};

pub struct FixedClock {
    now: Mutex<f64>,
}

impl FixedClock {
    pub fn at(now: f64) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: f64) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

type FrameFn = Box<dyn Fn(f64) -> Option<FrameOcr> + Send + Sync>;

pub struct FakeCapture {
    respond: FrameFn,
    requests: Mutex<Vec<f64>>,
}

impl FakeCapture {
    pub fn with(respond: impl Fn(f64) -> Option<FrameOcr> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request yields a fresh frame stamped with the requested time.
    pub fn echo() -> Self {
        Self::with(|requested| {
            Some(FrameOcr {
                text: Some(format!("ocr at {requested}")),
                timestamp: Some(requested),
                app_name: Some("Terminal".into()),
                bundle_id: Some("com.apple.Terminal".into()),
                ..FrameOcr::default()
            })
        })
    }

    pub fn requests(&self) -> Vec<f64> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptureProvider for FakeCapture {
    async fn frame_ocr(&self, timestamp: f64) -> Result<Option<FrameOcr>> {
        self.requests.lock().unwrap().push(timestamp);
        Ok((self.respond)(timestamp))
    }
}

pub struct FakeSummarizer {
    reply: Option<SummaryResponse>,
    delay: Duration,
    requests: Mutex<Vec<SummaryRequest>>,
}

impl FakeSummarizer {
    pub fn replying(reply: SummaryResponse) -> Self {
        Self {
            reply: Some(reply),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn query(&self, request: SummaryRequest) -> Result<SummaryResponse> {
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply
            .clone()
            .ok_or_else(|| anyhow!("summarizer unavailable"))
    }
}

pub struct FakeRenderer {
    window_id: WindowId,
    requests: Mutex<Vec<RenderRequest>>,
}

impl FakeRenderer {
    pub fn new(window_id: WindowId) -> Self {
        Self {
            window_id,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl UiRenderer for FakeRenderer {
    async fn render(&self, request: RenderRequest) -> Result<WindowId> {
        self.requests.lock().unwrap().push(request);
        Ok(self.window_id)
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    shown: Mutex<Vec<String>>,
}

impl FakeNotifier {
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn show_notification(&self, text: &str) -> Result<Option<String>> {
        let mut shown = self.shown.lock().unwrap();
        shown.push(text.to_string());
        Ok(Some(format!("notification-{}", shown.len())))
    }
}
