//! Recently opened documents
//!
//! Ordered most-recent-first, deduplicated by identity, capped at ten
//! entries, and persisted as JSON in the platform data directory. Fed by
//! the lifecycle manager's `DocumentChanged` notification; the menu layer
//! renders it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::document::DocumentEvent;
use crate::storage::EntryId;

const MAX_RECENT: usize = 10;

/// One remembered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub id: EntryId,
    pub name: String,
}

/// Persistent list of recently opened documents.
#[derive(Debug)]
pub struct RecentFiles {
    path: PathBuf,
    entries: Mutex<Vec<RecentEntry>>,
}

impl RecentFiles {
    /// Open the default recent-files list for this application.
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().context("could not determine data directory")?;
        Self::open(path)
    }

    /// Open (or initialize) a recent-files list at an explicit path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "markwright", "Markwright")
            .map(|dirs| dirs.data_dir().join("recent-files.json"))
    }

    fn load(path: &Path) -> Result<Vec<RecentEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recent files: {}", path.display()))?;
        let entries: Vec<RecentEntry> = serde_json::from_str(&content).unwrap_or_default();

        // Local identities are paths; drop the ones that no longer exist.
        // Cloud identities are opaque and kept as-is.
        Ok(entries
            .into_iter()
            .filter(|entry| {
                let path = Path::new(entry.id.as_str());
                !path.is_absolute() || path.exists()
            })
            .take(MAX_RECENT)
            .collect())
    }

    fn save(&self, entries: &[RecentEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write recent files: {}", self.path.display()))?;
        Ok(())
    }

    pub fn entries(&self) -> Vec<RecentEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Push a document to the top of the list, deduplicated by identity.
    pub fn add(&self, id: EntryId, name: impl Into<String>) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|entry| entry.id != id);
        entries.insert(
            0,
            RecentEntry {
                id,
                name: name.into(),
            },
        );
        entries.truncate(MAX_RECENT);
        if let Err(err) = self.save(&entries) {
            tracing::warn!("Could not persist recent files: {err:#}");
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        if let Err(err) = self.save(&entries) {
            tracing::warn!("Could not persist recent files: {err:#}");
        }
    }

    /// Record a lifecycle notification. Only saved documents (those with
    /// an identity) are remembered.
    pub fn apply_event(&self, event: &DocumentEvent) {
        if let DocumentEvent::DocumentChanged {
            identity: Some(id),
            display_name,
        } = event
        {
            let name = display_name
                .clone()
                .unwrap_or_else(|| id.basename().to_string());
            self.add(id.clone(), name);
        }
    }
}
