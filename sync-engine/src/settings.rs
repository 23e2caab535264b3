//! Persistence of [`SyncSettings`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::SyncSettings;
use crate::error::Result;

/// Settings file used when no path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "FileSync.settings.json";

/// Loads and saves the rule configuration.
pub trait SettingsStore: Send + Sync {
    /// Load settings. Never fails: unreadable or malformed data yields empty
    /// settings. Every rule comes back disabled with at least one filter.
    fn load(&self) -> SyncSettings;

    /// Overwrite the stored settings.
    fn save(&self, settings: &SyncSettings) -> Result<()>;
}

/// Settings stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<SyncSettings> {
        if !self.path.exists() {
            debug!("No settings file at {}", self.path.display());
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!(
                    "Failed to parse settings {}, starting fresh: {e}",
                    self.path.display()
                );
                None
            }
        }
    }
}

impl Default for JsonSettingsStore {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_FILE)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> SyncSettings {
        let mut settings = self.read().unwrap_or_default();
        settings.normalize();
        info!(
            "Loaded {} sync rules from {}",
            settings.rules.len(),
            self.path.display()
        );
        settings
    }

    fn save(&self, settings: &SyncSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(settings)?;

        // Write atomically using a temp file
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
