//! Guest mode backend
//!
//! Active before sign-in. Editing happens purely in memory: every
//! persistence operation fails with a capability error carrying the
//! sign-in prompt, and listing always comes back empty.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage::{
    Capabilities, DirectoryEntry, EntryId, ProviderKind, StorageProvider,
};

const SIGN_IN_TO_OPEN: &str = "Sign in to open your files.";
const SIGN_IN_TO_SAVE: &str = "Sign in to save your work.";

/// Read-only in-memory provider for signed-out sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct GuestProvider;

impl GuestProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageProvider for GuestProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Guest
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    async fn list_directory(&self, _folder: &EntryId) -> Result<Vec<DirectoryEntry>, StorageError> {
        Ok(Vec::new())
    }

    async fn read_file(&self, _id: &EntryId) -> Result<String, StorageError> {
        Err(StorageError::capability(SIGN_IN_TO_OPEN))
    }

    async fn write_file(&self, _id: &EntryId, _content: &str) -> Result<(), StorageError> {
        Err(StorageError::capability(SIGN_IN_TO_SAVE))
    }

    async fn create_file(
        &self,
        _parent: &EntryId,
        _name: &str,
        _content: &str,
    ) -> Result<EntryId, StorageError> {
        Err(StorageError::capability(SIGN_IN_TO_SAVE))
    }

    async fn parent_folder(&self, _id: &EntryId) -> Result<Option<EntryId>, StorageError> {
        Err(StorageError::capability(SIGN_IN_TO_OPEN))
    }
}
