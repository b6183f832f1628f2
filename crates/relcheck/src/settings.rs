use std::sync::Mutex;

use chrono::{DateTime, Utc};
use relcheck_core::OptionsStore;
use relcheck_platform::AppPaths;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings_save::SettingsSaver;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "App/Auto/Check For Updates", default = "default_true")]
    pub auto_check_for_updates: bool,

    /// Epoch seconds of the next automatic check.
    #[serde(rename = "Version/Next Check", default)]
    pub next_check: i64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_check_for_updates: true,
            next_check: 0,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl AppSettings {
    /// Read the settings file, falling back to defaults when it is missing or
    /// unreadable.
    pub fn load(paths: &AppPaths) -> Self {
        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&settings_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring unreadable settings file: {error}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), SettingsError> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.settings_file(), content)?;
        Ok(())
    }

    pub fn next_check_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.next_check, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// [`OptionsStore`] backed by the settings file. Every change is queued for a
/// debounced write.
pub struct SettingsStore {
    settings: Mutex<AppSettings>,
    saver: Mutex<Option<SettingsSaver>>,
}

impl SettingsStore {
    pub fn new(settings: AppSettings, paths: Option<AppPaths>) -> Self {
        Self {
            settings: Mutex::new(settings),
            saver: Mutex::new(paths.map(SettingsSaver::spawn)),
        }
    }

    #[cfg(test)]
    fn snapshot(&self) -> AppSettings {
        self.settings().clone()
    }

    /// Write any pending change and stop the save thread. Later changes stay
    /// in memory only.
    pub fn flush(&self) {
        let saver = self
            .saver
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(saver) = saver {
            saver.finish();
        }
    }

    fn settings(&self) -> std::sync::MutexGuard<'_, AppSettings> {
        self.settings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn update(&self, change: impl FnOnce(&mut AppSettings)) {
        let snapshot = {
            let mut settings = self.settings();
            change(&mut settings);
            settings.clone()
        };
        if let Some(saver) = self
            .saver
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
        {
            saver.enqueue(snapshot);
        }
    }
}

impl OptionsStore for SettingsStore {
    fn auto_check_enabled(&self) -> bool {
        self.settings().auto_check_for_updates
    }

    fn set_auto_check_enabled(&self, enabled: bool) {
        self.update(|settings| settings.auto_check_for_updates = enabled);
    }

    fn next_check(&self) -> DateTime<Utc> {
        self.settings().next_check_time()
    }

    fn set_next_check(&self, at: DateTime<Utc>) {
        self.update(|settings| settings.next_check = at.timestamp());
    }
}
