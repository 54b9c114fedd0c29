use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerSettings {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Fraction of a section that must be on screen to count as viewed.
    pub intersection_threshold: f64,
    /// Smallest unreported dwell time worth a `SECTION_TIME` event.
    pub min_section_time_ms: u64,
    pub feedback_ttl_ms: u64,
    pub unload_flush_timeout_ms: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".into(),
            request_timeout_ms: 10_000,
            intersection_threshold: 0.5,
            min_section_time_ms: 1_000,
            feedback_ttl_ms: 3_000,
            unload_flush_timeout_ms: 2_000,
        }
    }
}

impl TrackerSettings {
    fn normalized(mut self) -> Self {
        self.intersection_threshold = if self.intersection_threshold.is_finite() {
            self.intersection_threshold.clamp(0.0, 1.0)
        } else {
            TrackerSettings::default().intersection_threshold
        };
        self
    }

    pub fn feedback_ttl(&self) -> Duration {
        Duration::from_millis(self.feedback_ttl_ms)
    }

    pub fn unload_flush_timeout(&self) -> Duration {
        Duration::from_millis(self.unload_flush_timeout_ms)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TrackerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<TrackerSettings>(&contents)
                .unwrap_or_default()
                .normalized()
        } else {
            TrackerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> TrackerSettings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update(&self, settings: TrackerSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = settings.normalized();
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: TrackerSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data.normalized();
        Ok(())
    }

    fn persist(&self, data: &TrackerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("tracker.json")).unwrap();
        assert_eq!(store.settings(), TrackerSettings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, r#"{"apiBaseUrl":"https://api.example.com","intersectionThreshold":4}"#)
            .unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.api_base_url, "https://api.example.com");
        assert_eq!(settings.intersection_threshold, 1.0);
        assert_eq!(settings.min_section_time_ms, 1_000);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.settings(), TrackerSettings::default());
        assert!(store.reload().is_err());
    }

    #[test]
    fn update_persists_and_reload_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.min_section_time_ms = 2_500;
        store.update(settings).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.settings().min_section_time_ms, 2_500);
        reopened.reload().unwrap();
        assert_eq!(reopened.settings().min_section_time_ms, 2_500);
    }
}
