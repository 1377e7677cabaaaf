//! Preference persistence
//!
//! A flat string map that survives restarts: the folder navigator records
//! the last-visited folder and panel width here and reads them back once
//! at startup. Persistence failures are advisory — a missing or unreadable
//! preference file means defaults, never an error surfaced to the user.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Key for the identity of the last folder the navigator visited.
pub const LAST_FOLDER_KEY: &str = "last_folder_id";
/// Key for the folder-panel width in pixels.
pub const PANEL_WIDTH_KEY: &str = "panel_width_px";

/// Flat persistent string map.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Preferences kept only for the lifetime of the process. Used in tests
/// and for guest sessions, where nothing should outlive the window.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}

/// Preferences persisted as a JSON object in the platform config
/// directory. Writes go through to disk on every mutation.
#[derive(Debug)]
pub struct DiskPreferences {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl DiskPreferences {
    /// Open the default preference file for this application.
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().context("could not determine config directory")?;
        Self::open(path)
    }

    /// Open (or initialize) a preference file at an explicit path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = Self::load(&path)?;
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "markwright", "Markwright")
            .map(|dirs| dirs.config_dir().join("preferences.json"))
    }

    fn load(path: &Path) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read preferences: {}", path.display()))?;
        let values = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse preferences: {}", path.display()))?;
        Ok(values)
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write preferences: {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for DiskPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.to_string());
        if let Err(err) = self.save(&values) {
            tracing::warn!("Could not persist preferences: {err:#}");
        }
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock().unwrap();
        values.remove(key);
        if let Err(err) = self.save(&values) {
            tracing::warn!("Could not persist preferences: {err:#}");
        }
    }
}
