use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{clock::Clock, store::keys, store::KvStore};

use super::{
    log::ActivityLog,
    render::{build_view, default_icon, ActivityView},
    window::WindowManager,
};

/// Loads the log, builds the view and hands it to the window.
#[derive(Clone)]
pub struct ActivityPresenter {
    store: Arc<dyn KvStore>,
    log: ActivityLog,
    windows: WindowManager,
    clock: Arc<dyn Clock>,
}

impl ActivityPresenter {
    pub fn new(
        store: Arc<dyn KvStore>,
        log: ActivityLog,
        windows: WindowManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            log,
            windows,
            clock,
        }
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub async fn render_activity(&self) -> Result<ActivityView> {
        let entries = self.log.entries().await?;

        let icon = match entries.last().and_then(|entry| entry.bundle_id.as_deref()) {
            Some(bundle_id) => self.store.get(&keys::bundle_icon(bundle_id)).await?,
            None => None,
        };

        let view = build_view(
            entries,
            self.clock.now(),
            icon.unwrap_or_else(default_icon),
        );

        let payload = serde_json::to_value(&view).context("failed to encode activity view")?;
        self.windows.show(payload).await?;
        Ok(view)
    }
}
