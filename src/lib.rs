//! Markwright storage core
//!
//! The document-storage layer of the Markwright markdown editor: a
//! provider abstraction that lets the same editor logic run against the
//! local filesystem, a cloud drive, or a read-only guest mode, plus the
//! file lifecycle (dirty tracking, save/save-as) and the folder navigator
//! built on top of it.
//!
//! The UI embeds this crate through four seams:
//!
//! - [`ProviderRegistry`] holds the single active [`StorageProvider`].
//!   Switching providers (guest → cloud after sign-in) bumps a generation
//!   counter; in-flight work against the old provider is discarded, and
//!   the navigator must be [`reset`](FolderNavigator::reset) and
//!   restarted.
//! - [`DocumentManager`] owns the open [`Document`] and emits
//!   [`DocumentEvent`]s for the title bar and the [`RecentFiles`] list.
//! - [`FolderNavigator`] drives the folder panel and persists its state
//!   through a [`PreferenceStore`].
//! - [`ErrorSink`] receives every user-facing failure message.

pub mod document;
pub mod error;
pub mod navigator;
pub mod prefs;
pub mod recent;
pub mod storage;

pub use document::{Document, DocumentEvent, DocumentManager, OpStatus, SavePrompt};
pub use error::{ErrorSink, LogErrorSink, StorageError};
pub use navigator::{FolderListing, FolderNavigator, ROOT_SENTINEL};
pub use prefs::{
    DiskPreferences, MemoryPreferences, PreferenceStore, LAST_FOLDER_KEY, PANEL_WIDTH_KEY,
};
pub use recent::{RecentEntry, RecentFiles};
pub use storage::cloud::{CloudConfig, CloudProvider};
pub use storage::guest::GuestProvider;
pub use storage::local::LocalProvider;
pub use storage::registry::ProviderRegistry;
pub use storage::{
    Capabilities, DirectoryEntry, EntryId, ProviderKind, SaveTarget, StorageProvider,
};
