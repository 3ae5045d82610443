use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::{
    activity::{ActivityLog, ActivityPresenter},
    host_bridge::{SummaryRequest, Summarizer},
    models::{ActivitySummaryEntry, PendingBatch},
};

use super::{
    gate::{GateOutcome, SingleflightGate},
    prompt::build_payload,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Appended(ActivitySummaryEntry),
    /// The batch had no samples; the summarizer was not called.
    Empty,
    /// A run was already in flight; the batch was dropped.
    Refused,
}

/// Batch → summarizer → activity log, behind the singleflight gate.
#[derive(Clone)]
pub struct SummaryPipeline {
    gate: SingleflightGate,
    summarizer: Arc<dyn Summarizer>,
    log: ActivityLog,
    presenter: ActivityPresenter,
    instructions: String,
}

impl SummaryPipeline {
    pub fn new(
        gate: SingleflightGate,
        summarizer: Arc<dyn Summarizer>,
        log: ActivityLog,
        presenter: ActivityPresenter,
        instructions: String,
    ) -> Self {
        Self {
            gate,
            summarizer,
            log,
            presenter,
            instructions,
        }
    }

    pub async fn summarize(&self, batch: PendingBatch) -> Result<SummaryOutcome> {
        let sample_count = batch.len();

        match self.gate.run(|| self.summarize_batch(batch)).await? {
            GateOutcome::Completed(outcome) => Ok(outcome),
            GateOutcome::Refused => {
                log_info!(
                    "Summarization already running, dropping batch of {} samples",
                    sample_count
                );
                Ok(SummaryOutcome::Refused)
            }
        }
    }

    async fn summarize_batch(&self, batch: PendingBatch) -> Result<SummaryOutcome> {
        let Some(last) = batch.last() else {
            log_warn!("Empty OCR batch in summarization task");
            return Ok(SummaryOutcome::Empty);
        };

        let request = SummaryRequest {
            instructions: self.instructions.clone(),
            text: build_payload(&batch),
        };

        let response = self
            .summarizer
            .query(request)
            .await
            .context("summarizer request failed")?;
        let summary = response
            .text
            .ok_or_else(|| anyhow!("summarizer reply carried no text"))?;

        log_info!("Got summary for {} samples", batch.len());

        let entry = ActivitySummaryEntry {
            app_name: last.app_name.clone(),
            bundle_id: last.bundle_id.clone(),
            timestamp: last.timestamp,
            summary,
            cost: ActivitySummaryEntry::format_cost(response.cost.unwrap_or(0.0)),
        };
        self.log.append(entry.clone()).await?;

        if !self.presenter.windows().is_hidden().await? {
            // The entry is already logged; a failed refresh only affects the open window.
            if let Err(err) = self.presenter.render_activity().await {
                log_error!("Failed to refresh activity window: {err:?}");
            }
        }

        Ok(SummaryOutcome::Appended(entry))
    }
}
