//! Storage provider contract and the backend implementations

pub mod cloud;
pub mod guest;
pub mod local;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// File extensions treated as markdown documents
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Backend-scoped identifier for a file or folder.
///
/// An absolute path string for the local backend, an opaque object id for
/// the cloud backend. Usable directly as a navigation target or document
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identifier, for display fallback.
    pub fn basename(&self) -> &str {
        self.0
            .rfind(|c| c == '/' || c == '\\')
            .map(|i| &self.0[i + 1..])
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single entry in a directory listing.
///
/// Immutable snapshot of one listing call; never retained across
/// navigations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: EntryId,
    pub name: String,
    pub is_directory: bool,
}

/// Where a save-as operation should write, as chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// Overwrite an existing file.
    Existing(EntryId),
    /// Create a new file under `parent`.
    New { parent: EntryId, name: String },
}

/// Which backend is active; used for logging and UI affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Local,
    Cloud,
    Guest,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
            Self::Guest => "guest",
        };
        f.write_str(name)
    }
}

/// Declared capability set of a backend.
///
/// Callers branch on these flags instead of probing for dispatch failure;
/// an absent capability must be distinguishable from a runtime failure of
/// the same operation (e.g. `parent_lookup == false` vs "already at root").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub create_folder: bool,
    pub parent_lookup: bool,
    pub root_folder: bool,
    pub open_dialog: bool,
    pub save_dialog: bool,
}

/// Contract every storage backend implements.
///
/// All operations are asynchronous and may fail with a [`StorageError`].
/// Optional operations have defaults that fail with
/// [`StorageError::CapabilityUnavailable`]; callers are expected to gate on
/// [`StorageProvider::capabilities`] first.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn capabilities(&self) -> Capabilities;

    /// List `folder`, filtered to non-hidden directories and markdown
    /// files, directories first, case-insensitive name order within each
    /// group.
    async fn list_directory(&self, folder: &EntryId) -> Result<Vec<DirectoryEntry>, StorageError>;

    /// Read the whole file. All-or-nothing; never returns truncated
    /// content.
    async fn read_file(&self, id: &EntryId) -> Result<String, StorageError>;

    /// Overwrite the file. Atomic from the caller's perspective: either the
    /// whole new content is visible afterwards, or the prior content is
    /// unchanged.
    async fn write_file(&self, id: &EntryId, content: &str) -> Result<(), StorageError>;

    /// Create a file under `parent`. The returned identity is assigned by
    /// the backend and may differ from `name`.
    async fn create_file(
        &self,
        parent: &EntryId,
        name: &str,
        content: &str,
    ) -> Result<EntryId, StorageError>;

    async fn create_folder(&self, _parent: &EntryId, _name: &str) -> Result<EntryId, StorageError> {
        Err(StorageError::capability(
            "Folder creation is not available here.",
        ))
    }

    /// Resolve the live parent of `id`. `None` signals root. Never cached
    /// by callers: a cloud object may be reparented out of band between
    /// calls.
    async fn parent_folder(&self, id: &EntryId) -> Result<Option<EntryId>, StorageError>;

    async fn root_folder(&self) -> Result<EntryId, StorageError> {
        Err(StorageError::capability("No root folder available."))
    }

    /// Let the user pick a file to open. `Ok(None)` means cancelled, never
    /// an error.
    async fn show_open_dialog(&self) -> Result<Option<EntryId>, StorageError> {
        Err(StorageError::capability(
            "Opening files is not available here.",
        ))
    }

    /// Let the user pick a save target. `Ok(None)` means cancelled, never
    /// an error.
    async fn show_save_dialog(
        &self,
        _default_name: &str,
    ) -> Result<Option<SaveTarget>, StorageError> {
        Err(StorageError::capability("Saving is not available here."))
    }
}

/// Check whether a file name carries a markdown extension,
/// case-insensitive.
pub fn is_markdown_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Apply the listing contract shared by all backends: keep non-hidden
/// directories and markdown files, directories before files, each group in
/// case-insensitive ascending name order.
pub(crate) fn filter_and_sort(mut entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
    entries.retain(|entry| {
        if entry.is_directory {
            !entry.name.starts_with('.')
        } else {
            is_markdown_name(&entry.name)
        }
    });
    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
    entries
}
