//! Local filesystem backend
//!
//! Identities are absolute path strings, so parent resolution is pure path
//! manipulation and never touches the disk. Listing failures (permissions,
//! missing directory) degrade to an empty listing with a logged warning.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::UserDirs;

use crate::error::StorageError;
use crate::storage::{
    filter_and_sort, Capabilities, DirectoryEntry, EntryId, ProviderKind, SaveTarget,
    StorageProvider, MARKDOWN_EXTENSIONS,
};

/// Storage provider backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageProvider for LocalProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            read: true,
            write: true,
            create: true,
            create_folder: true,
            parent_lookup: true,
            root_folder: true,
            open_dialog: true,
            save_dialog: true,
        }
    }

    async fn list_directory(&self, folder: &EntryId) -> Result<Vec<DirectoryEntry>, StorageError> {
        let mut dir = match tokio::fs::read_dir(folder.as_str()).await {
            Ok(dir) => dir,
            Err(err) => {
                tracing::warn!("Could not list {folder}: {err}");
                return Ok(Vec::new());
            }
        };

        let mut entries = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let Ok(file_type) = entry.file_type().await else {
                        continue;
                    };
                    entries.push(DirectoryEntry {
                        id: EntryId::new(entry.path().to_string_lossy().into_owned()),
                        name,
                        is_directory: file_type.is_dir(),
                    });
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!("Could not read an entry in {folder}: {err}");
                    break;
                }
            }
        }

        Ok(filter_and_sort(entries))
    }

    async fn read_file(&self, id: &EntryId) -> Result<String, StorageError> {
        tokio::fs::read_to_string(id.as_str())
            .await
            .map_err(|err| StorageError::from_io(id.as_str(), err))
    }

    async fn write_file(&self, id: &EntryId, content: &str) -> Result<(), StorageError> {
        let path = Path::new(id.as_str());
        let file_name = path
            .file_name()
            .ok_or_else(|| StorageError::Io(format!("{id}: not a file path")))?;

        // Write a sibling temp file, then rename over the target, so a
        // failed write leaves the prior content untouched.
        let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|err| StorageError::from_io(id.as_str(), err))?;

        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::from_io(id.as_str(), err));
        }

        tracing::info!("Saved file: {id}");
        Ok(())
    }

    async fn create_file(
        &self,
        parent: &EntryId,
        name: &str,
        content: &str,
    ) -> Result<EntryId, StorageError> {
        let parent_path = PathBuf::from(parent.as_str());
        tokio::fs::create_dir_all(&parent_path)
            .await
            .map_err(|err| StorageError::from_io(parent.as_str(), err))?;

        let id = EntryId::new(parent_path.join(name).to_string_lossy().into_owned());
        self.write_file(&id, content).await?;
        Ok(id)
    }

    async fn create_folder(&self, parent: &EntryId, name: &str) -> Result<EntryId, StorageError> {
        let path = Path::new(parent.as_str()).join(name);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|err| StorageError::from_io(parent.as_str(), err))?;
        Ok(EntryId::new(path.to_string_lossy().into_owned()))
    }

    async fn parent_folder(&self, id: &EntryId) -> Result<Option<EntryId>, StorageError> {
        let parent = Path::new(id.as_str())
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| EntryId::new(p.to_string_lossy().into_owned()));
        Ok(parent)
    }

    async fn root_folder(&self) -> Result<EntryId, StorageError> {
        UserDirs::new()
            .map(|dirs| EntryId::new(dirs.home_dir().to_string_lossy().into_owned()))
            .ok_or_else(|| StorageError::Io("could not determine the home directory".to_string()))
    }

    async fn show_open_dialog(&self) -> Result<Option<EntryId>, StorageError> {
        let picked = rfd::AsyncFileDialog::new()
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .pick_file()
            .await;
        Ok(picked.map(|handle| EntryId::new(handle.path().to_string_lossy().into_owned())))
    }

    async fn show_save_dialog(
        &self,
        default_name: &str,
    ) -> Result<Option<SaveTarget>, StorageError> {
        let Some(handle) = rfd::AsyncFileDialog::new()
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .set_file_name(default_name)
            .save_file()
            .await
        else {
            return Ok(None);
        };

        let path = handle.path();
        let target = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) if !path.exists() => SaveTarget::New {
                parent: EntryId::new(parent.to_string_lossy().into_owned()),
                name: name.to_string_lossy().into_owned(),
            },
            _ => SaveTarget::Existing(EntryId::new(path.to_string_lossy().into_owned())),
        };
        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_for(path: &Path) -> EntryId {
        EntryId::new(path.to_string_lossy().into_owned())
    }

    fn init_logs() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new();
        let id = id_for(&dir.path().join("notes.md"));

        provider.write_file(&id, "# hello\n").await.unwrap();
        assert_eq!(provider.read_file(&id).await.unwrap(), "# hello\n");

        provider.write_file(&id, "replaced").await.unwrap();
        assert_eq!(provider.read_file(&id).await.unwrap(), "replaced");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new();
        let id = id_for(&dir.path().join("missing.md"));

        let err = provider.read_file(&id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("drafts")).unwrap();
        std::fs::create_dir(root.join(".hidden")).unwrap();
        std::fs::write(root.join("notes.md"), "n").unwrap();
        std::fs::write(root.join("img.png"), "p").unwrap();

        let provider = LocalProvider::new();
        let listed = provider.list_directory(&id_for(root)).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "drafts");
        assert!(listed[0].is_directory);
        assert_eq!(listed[0].id, id_for(&root.join("drafts")));
        assert_eq!(listed[1].name, "notes.md");
        assert!(!listed[1].is_directory);
        assert_eq!(listed[1].id, id_for(&root.join("notes.md")));
    }

    #[tokio::test]
    async fn test_listing_missing_directory_degrades_to_empty() {
        init_logs();
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new();
        let gone = id_for(&dir.path().join("nope"));

        assert!(provider.list_directory(&gone).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_preserves_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new();
        let id = id_for(&dir.path().join("notes.md"));
        provider.write_file(&id, "original").await.unwrap();

        // A target inside a missing directory cannot even stage its temp
        // file; the original file must be unaffected.
        let bad = id_for(&dir.path().join("missing-dir").join("notes.md"));
        assert!(provider.write_file(&bad, "new").await.is_err());
        assert_eq!(provider.read_file(&id).await.unwrap(), "original");
    }

    #[tokio::test]
    async fn test_create_file_returns_full_path_identity() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new();

        let id = provider
            .create_file(&id_for(dir.path()), "new.md", "body")
            .await
            .unwrap();
        assert_eq!(id, id_for(&dir.path().join("new.md")));
        assert_eq!(provider.read_file(&id).await.unwrap(), "body");
    }

    #[tokio::test]
    async fn test_parent_resolution_is_pure_path_walk() {
        let provider = LocalProvider::new();

        let parent = provider
            .parent_folder(&EntryId::new("/home/user/notes.md"))
            .await
            .unwrap();
        assert_eq!(parent, Some(EntryId::new("/home/user")));

        let root = provider.parent_folder(&EntryId::new("/")).await.unwrap();
        assert_eq!(root, None);
    }
}
