use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    activity::WindowConfig, capture::CaptureConfig, summarize::SummaryConfig,
    tracking::TrackingConfig,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImmersionSettings {
    pub tracking: TrackingConfig,
    pub capture: CaptureConfig,
    pub summary: SummaryConfig,
    pub window: WindowConfig,
}

impl ImmersionSettings {
    pub fn validate(&self) -> Result<()> {
        self.tracking.validate().context("invalid tracking settings")?;
        self.capture.validate().context("invalid capture settings")?;
        self.summary.validate().context("invalid summary settings")?;
        Ok(())
    }

    /// Reset every section that fails validation to its defaults.
    fn sanitized(mut self, source: &Path) -> Self {
        if let Err(err) = self.tracking.validate() {
            log::warn!("Ignoring tracking settings in {}: {err}", source.display());
            self.tracking = TrackingConfig::default();
        }
        if let Err(err) = self.capture.validate() {
            log::warn!("Ignoring capture settings in {}: {err}", source.display());
            self.capture = CaptureConfig::default();
        }
        if let Err(err) = self.summary.validate() {
            log::warn!("Ignoring summary settings in {}: {err}", source.display());
            self.summary = SummaryConfig::default();
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ImmersionSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<ImmersionSettings>(&contents) {
                Ok(settings) => settings.sanitized(&path),
                Err(err) => {
                    log::warn!(
                        "Ignoring unreadable settings in {}: {err}",
                        path.display()
                    );
                    ImmersionSettings::default()
                }
            }
        } else {
            ImmersionSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> ImmersionSettings {
        self.read().clone()
    }

    /// Apply `apply` to a copy, validate it, then persist and publish it.
    pub fn update(&self, apply: impl FnOnce(&mut ImmersionSettings)) -> Result<ImmersionSettings> {
        let mut guard = self.write();
        let mut next = guard.clone();
        apply(&mut next);
        next.validate()?;
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    fn persist(&self, data: &ImmersionSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, ImmersionSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ImmersionSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        let settings = store.snapshot();
        assert_eq!(settings.tracking.max_gap_secs, 20.0);
        assert_eq!(settings.capture.max_samples, 5);
        assert_eq!(settings.window.width, 420);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"capture": {"settle_secs": 45.0}}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().snapshot();
        assert_eq!(settings.capture.settle_secs, 45.0);
        assert_eq!(settings.capture.max_drift_secs, 10.0);
        assert_eq!(settings.summary.lease_secs, 300.0);
    }

    #[test]
    fn updates_are_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update(|settings| settings.window.tag = "activity".into())
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.snapshot().window.tag, "activity");
    }

    #[test]
    fn invalid_sections_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"capture": {"sample_spacing_secs": 0.0}, "tracking": {"max_gap_secs": 30.0}}"#,
        )
        .unwrap();

        let settings = SettingsStore::new(path).unwrap().snapshot();
        assert_eq!(settings.capture, CaptureConfig::default());
        assert_eq!(settings.tracking.max_gap_secs, 30.0);
    }

    #[test]
    fn invalid_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let result = store.update(|settings| settings.summary.lease_secs = 0.0);

        assert!(result.is_err());
        assert_eq!(store.snapshot().summary.lease_secs, 300.0);
        assert!(!path.exists());
    }
}
