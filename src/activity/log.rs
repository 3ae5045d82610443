use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    models::ActivitySummaryEntry,
    store::{get_json, keys, update_json, KvStore},
};

/// Append-only timeline of summaries.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn KvStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Append one entry; returns the new length of the log.
    pub async fn append(&self, entry: ActivitySummaryEntry) -> Result<usize> {
        update_json(
            self.store.as_ref(),
            keys::ACTIVITY,
            move |entries: Option<Vec<ActivitySummaryEntry>>| {
                let mut entries = entries.unwrap_or_default();
                entries.push(entry);
                let len = entries.len();
                Ok((Some(entries), len))
            },
        )
        .await
        .context("failed to append activity entry")
    }

    pub async fn entries(&self) -> Result<Vec<ActivitySummaryEntry>> {
        Ok(get_json(self.store.as_ref(), keys::ACTIVITY)
            .await
            .context("failed to load activity log")?
            .unwrap_or_default())
    }
}
