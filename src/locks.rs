use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use tokio::sync::Mutex;

/// Named locks shared by every handler of one extension instance.
///
/// Created once at startup and handed out behind an `Arc`, so exclusion holds across
/// separate event invocations.
#[derive(Default)]
pub struct Locks {
    /// Guards read-modify-write of the persisted interval list.
    pub intervals: Mutex<()>,
    /// Serializes OCR sample collection.
    pub capture: Mutex<()>,
    /// In-process half of the summarization singleflight.
    pub summary: Mutex<()>,
    windows: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Locks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Lock dedicated to one logical window, created on first use.
    pub fn window(&self, tag: &str) -> Arc<Mutex<()>> {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        windows
            .entry(tag.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
