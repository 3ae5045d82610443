//! Immersion: tracks user activity while screen recording is on, OCRs settled
//! activity intervals, summarizes them into a daily activity log and renders that log
//! into a host window.

pub mod activity;
pub mod capture;
pub mod clock;
pub mod controller;
pub mod events;
pub mod host_bridge;
pub mod locks;
pub mod models;
pub mod settings;
pub mod store;
pub mod summarize;
pub mod tracking;
pub mod utils;

#[cfg(test)]
mod testing;

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};

use locks::Locks;

pub use clock::{Clock, SystemClock};
pub use controller::{HostBridges, ImmersionController};
pub use events::HostEvent;
pub use settings::{ImmersionSettings, SettingsStore};
pub use store::{KvStore, MemoryStore, SqliteStore};

/// Key scope of every value this extension persists.
pub const EXTENSION_SCOPE: &str = "immersion";

/// An opened extension: its settings file and the controller built from them.
pub struct Immersion {
    settings: SettingsStore,
    store: Arc<dyn KvStore>,
    bridges: HostBridges,
    clock: Arc<dyn Clock>,
    locks: Arc<Locks>,
    controller: ImmersionController,
}

impl Immersion {
    pub fn controller(&self) -> &ImmersionController {
        &self.controller
    }

    pub fn settings(&self) -> ImmersionSettings {
        self.settings.snapshot()
    }

    /// Persist a settings change and rebuild the controller from it.
    ///
    /// The new controller shares the old one's store and locks.
    pub fn update_settings(&mut self, apply: impl FnOnce(&mut ImmersionSettings)) -> Result<()> {
        let settings = self.settings.update(apply)?;
        self.controller = ImmersionController::with_locks(
            self.store.clone(),
            self.bridges.clone(),
            self.clock.clone(),
            self.locks.clone(),
            &settings,
        );
        log::info!("Settings updated; controller rebuilt");
        Ok(())
    }
}

/// Open the extension's data directory and wire the controller to the host bridges.
pub async fn open(data_dir: &Path, bridges: HostBridges) -> Result<Immersion> {
    utils::logging::init();
    log::info!("Immersion starting up...");

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let store: Arc<dyn KvStore> = Arc::new(SqliteStore::new(
        data_dir.join("immersion.sqlite3"),
        EXTENSION_SCOPE,
    )?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let locks = Locks::new();

    let controller = ImmersionController::with_locks(
        store.clone(),
        bridges.clone(),
        clock.clone(),
        locks.clone(),
        &settings.snapshot(),
    );
    controller.startup().await?;

    Ok(Immersion {
        settings,
        store,
        bridges,
        clock,
        locks,
        controller,
    })
}
