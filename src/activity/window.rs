use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    host_bridge::{RenderRequest, UiRenderer, WindowId},
    locks::Locks,
    store::{get_json, keys, set_json, KvStore},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub template: String,
    pub tag: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            template: "activity.html".into(),
            tag: "main".into(),
            width: 420,
            height: 600,
        }
    }
}

/// Owns the single activity window: reuses its id across renders and tracks whether
/// the user closed it.
#[derive(Clone)]
pub struct WindowManager {
    store: Arc<dyn KvStore>,
    locks: Arc<Locks>,
    renderer: Arc<dyn UiRenderer>,
    config: WindowConfig,
}

impl WindowManager {
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: Arc<Locks>,
        renderer: Arc<dyn UiRenderer>,
        config: WindowConfig,
    ) -> Self {
        Self {
            store,
            locks,
            renderer,
            config,
        }
    }

    pub async fn show(&self, view: Value) -> Result<WindowId> {
        let lock = self.locks.window(&self.config.tag);
        let _guard = lock.lock().await;

        let window_id: Option<WindowId> = get_json(self.store.as_ref(), keys::WINDOW_ID).await?;
        let request = RenderRequest {
            template: self.config.template.clone(),
            view,
            width: self.config.width,
            height: self.config.height,
            reopen: true,
            window_tag: self.config.tag.clone(),
            window_id,
        };

        log_info!("Sending view render request");
        let window_id = self
            .renderer
            .render(request)
            .await
            .context("render request failed")?;
        log_info!("HTML rendered in window {window_id}");

        set_json(self.store.as_ref(), keys::WINDOW_ID, &window_id).await?;
        self.store.remove(keys::HIDDEN).await?;
        Ok(window_id)
    }

    /// The user closed the window: forget its id and stop live re-renders.
    pub async fn window_will_close(&self) -> Result<()> {
        self.store.remove(keys::WINDOW_ID).await?;
        self.store.set(keys::HIDDEN, "1").await
    }

    pub async fn is_hidden(&self) -> Result<bool> {
        Ok(self.store.get(keys::HIDDEN).await?.is_some())
    }

    /// Drop the window id left by a previous process; the host closed it on exit.
    pub async fn reset(&self) -> Result<()> {
        self.store.remove(keys::WINDOW_ID).await
    }
}
