//! Folder navigation: listing, parent resolution, and synchronization
//! with the open document

use std::sync::{Arc, Mutex};

use crate::prefs::{PreferenceStore, LAST_FOLDER_KEY, PANEL_WIDTH_KEY};
use crate::storage::registry::ProviderRegistry;
use crate::storage::{DirectoryEntry, EntryId};

/// Navigation target used when the backend has no root capability and no
/// preference was persisted.
pub const ROOT_SENTINEL: &str = "/";

/// One rendered folder view: the folder, its live parent (when the
/// backend can resolve one — gates the ".." pseudo-entry), and the
/// filtered, sorted entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderListing {
    pub folder: EntryId,
    pub parent: Option<EntryId>,
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Debug, Default)]
struct NavState {
    current_folder: Option<EntryId>,
    listing: Option<FolderListing>,
    request_seq: u64,
}

/// Maintains current-directory state for the folder panel.
///
/// Cheaply cloneable; clones share state, so overlapping navigations from
/// an event loop resolve against the same supersession counter: only the
/// most recently initiated navigation may publish its result.
#[derive(Clone)]
pub struct FolderNavigator {
    registry: ProviderRegistry,
    prefs: Arc<dyn PreferenceStore>,
    state: Arc<Mutex<NavState>>,
}

impl FolderNavigator {
    pub fn new(registry: ProviderRegistry, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self {
            registry,
            prefs,
            state: Arc::new(Mutex::new(NavState::default())),
        }
    }

    pub fn current_folder(&self) -> Option<EntryId> {
        self.state.lock().unwrap().current_folder.clone()
    }

    /// The most recently published listing.
    pub fn listing(&self) -> Option<FolderListing> {
        self.state.lock().unwrap().listing.clone()
    }

    /// Resolve the startup folder and navigate there: the persisted
    /// last-visited folder when one exists, else the provider's root,
    /// else the fixed sentinel.
    pub async fn start(&self) -> Option<FolderListing> {
        if let Some(last) = self.prefs.get(LAST_FOLDER_KEY) {
            return self.navigate_to(EntryId::new(last)).await;
        }

        let (provider, _) = self.registry.active();
        if provider.capabilities().root_folder {
            match provider.root_folder().await {
                Ok(root) => return self.navigate_to(root).await,
                Err(err) => {
                    tracing::warn!("Could not resolve the root folder: {err}");
                }
            }
        }

        self.navigate_to(EntryId::new(ROOT_SENTINEL)).await
    }

    /// Navigate to `folder`: persist it, fetch listing and parent
    /// concurrently, and publish the result unless a newer navigation or
    /// a provider switch superseded this one in the meantime. Returns
    /// `None` when the result was discarded.
    pub async fn navigate_to(&self, folder: EntryId) -> Option<FolderListing> {
        let (provider, generation) = self.registry.active();

        let seq = {
            let mut state = self.state.lock().unwrap();
            state.request_seq += 1;
            state.current_folder = Some(folder.clone());
            state.request_seq
        };
        self.prefs.set(LAST_FOLDER_KEY, folder.as_str());

        let parent_capable = provider.capabilities().parent_lookup;
        let (entries, parent) = tokio::join!(
            provider.list_directory(&folder),
            async {
                if parent_capable {
                    provider.parent_folder(&folder).await
                } else {
                    Ok(None)
                }
            }
        );

        // A failed listing degrades to an empty folder so browsing stays
        // usable when one subtree is unreadable.
        let entries = entries.unwrap_or_else(|err| {
            tracing::warn!("Could not list {folder}: {err}");
            Vec::new()
        });
        let parent = parent.unwrap_or_else(|err| {
            tracing::warn!("Could not resolve the parent of {folder}: {err}");
            None
        });

        let listing = FolderListing {
            folder,
            parent,
            entries,
        };

        let mut state = self.state.lock().unwrap();
        if state.request_seq != seq || !self.registry.is_current(generation) {
            tracing::debug!("Discarding superseded navigation to {}", listing.folder);
            return None;
        }
        state.listing = Some(listing.clone());
        Some(listing)
    }

    /// Keep the folder panel pointed at the folder containing `id`.
    /// Called after a document is opened or saved as new. Navigates only
    /// when the containing folder differs from the current one, avoiding
    /// a redundant relisting.
    pub async fn sync_to_file(&self, id: &EntryId) -> Option<FolderListing> {
        let (provider, _) = self.registry.active();
        if !provider.capabilities().parent_lookup {
            return None;
        }

        let parent = match provider.parent_folder(id).await {
            Ok(Some(parent)) => parent,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Could not resolve the folder containing {id}: {err}");
                return None;
            }
        };

        if self.current_folder().as_ref() == Some(&parent) {
            return None;
        }
        self.navigate_to(parent).await
    }

    /// Forget all navigation state. Called when the active provider is
    /// switched; folder identities do not carry across backends.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.current_folder = None;
        state.listing = None;
    }

    pub fn set_panel_width(&self, px: u32) {
        self.prefs.set(PANEL_WIDTH_KEY, &px.to_string());
    }

    pub fn panel_width(&self) -> Option<u32> {
        self.prefs.get(PANEL_WIDTH_KEY)?.parse().ok()
    }
}
