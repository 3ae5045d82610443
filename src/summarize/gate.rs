//! Durable single-flight lock around the summarizer.
//!
//! Two layers: an in-process `try_lock` so concurrent tasks of this instance refuse
//! immediately, and a persisted `SingleflightState` flipped with one atomic store
//! update so the flag survives restarts. Release happens on every exit path of
//! [`SingleflightGate::run`].

use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    clock::Clock,
    locks::Locks,
    store::{get_json, keys, update_json, KvStore},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SingleflightState {
    Idle,
    Running { run_id: String, since: f64 },
}

#[derive(Debug, PartialEq)]
pub enum GateOutcome<T> {
    Completed(T),
    /// Another run held the gate; the task was not started.
    Refused,
}

#[derive(Clone)]
pub struct SingleflightGate {
    store: Arc<dyn KvStore>,
    locks: Arc<Locks>,
    clock: Arc<dyn Clock>,
    lease_secs: f64,
}

impl SingleflightGate {
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: Arc<Locks>,
        clock: Arc<dyn Clock>,
        lease_secs: f64,
    ) -> Self {
        Self {
            store,
            locks,
            clock,
            lease_secs,
        }
    }

    pub async fn state(&self) -> Result<SingleflightState> {
        Ok(get_json(self.store.as_ref(), keys::SUMMARY_TASK)
            .await?
            .unwrap_or(SingleflightState::Idle))
    }

    /// Run `task` unless another run holds the gate.
    ///
    /// The flag goes back to idle whether `task` succeeds or fails.
    pub async fn run<F, Fut, T>(&self, task: F) -> Result<GateOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Ok(_local) = self.locks.summary.try_lock() else {
            return Ok(GateOutcome::Refused);
        };

        let Some(run_id) = self.acquire().await? else {
            return Ok(GateOutcome::Refused);
        };

        let pending = PendingRelease {
            store: Some(self.store.clone()),
            run_id: run_id.clone(),
        };
        let result = task().await;
        pending.disarm();

        if let Err(err) = release_flag(self.store.as_ref(), &run_id).await {
            log::error!("Failed to release summarization flag for run {run_id}: {err:?}");
            if result.is_ok() {
                return Err(err);
            }
        }

        result.map(GateOutcome::Completed)
    }

    async fn acquire(&self) -> Result<Option<String>> {
        let run_id = Uuid::new_v4().to_string();
        let candidate = run_id.clone();
        let now = self.clock.now();
        let lease_secs = self.lease_secs;

        let acquired = update_json(
            self.store.as_ref(),
            keys::SUMMARY_TASK,
            move |state: Option<SingleflightState>| match state {
                Some(SingleflightState::Running { run_id, since }) if now - since < lease_secs => {
                    Ok((Some(SingleflightState::Running { run_id, since }), false))
                }
                previous => {
                    if let Some(SingleflightState::Running { run_id, since }) = previous {
                        log::warn!(
                            "Taking over summarization flag held by run {run_id} since {since}"
                        );
                    }
                    let next = SingleflightState::Running {
                        run_id: candidate,
                        since: now,
                    };
                    Ok((Some(next), true))
                }
            },
        )
        .await
        .context("failed to acquire summarization flag")?;

        Ok(acquired.then_some(run_id))
    }

}

async fn release_flag(store: &dyn KvStore, run_id: &str) -> Result<()> {
    let owner = run_id.to_string();
    update_json(
        store,
        keys::SUMMARY_TASK,
        move |state: Option<SingleflightState>| match state {
            // A later run took the flag over after our lease ran out.
            Some(SingleflightState::Running { run_id, since }) if run_id != owner => {
                Ok((Some(SingleflightState::Running { run_id, since }), ()))
            }
            _ => Ok((Some(SingleflightState::Idle), ())),
        },
    )
    .await
    .context("failed to release summarization flag")
}

/// Releases the durable flag from a spawned task if a run is dropped or unwinds
/// before reaching its own release.
struct PendingRelease {
    store: Option<Arc<dyn KvStore>>,
    run_id: String,
}

impl PendingRelease {
    fn disarm(mut self) {
        self.store = None;
    }
}

impl Drop for PendingRelease {
    fn drop(&mut self) {
        let Some(store) = self.store.take() else {
            return;
        };
        let run_id = std::mem::take(&mut self.run_id);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::warn!("Summarization run {run_id} abandoned, releasing its flag");
                handle.spawn(async move {
                    if let Err(err) = release_flag(store.as_ref(), &run_id).await {
                        log::error!(
                            "Failed to release abandoned summarization flag {run_id}: {err:?}"
                        );
                    }
                });
            }
            Err(_) => log::warn!(
                "Summarization run {run_id} abandoned outside a runtime; its lease will expire"
            ),
        }
    }
}
