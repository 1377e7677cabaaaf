//! In-memory provider for unit tests.
//!
//! Backs files and folders with hash maps and exposes completion gates so
//! tests can hold a listing or read in flight and release it in a chosen
//! order, which makes supersession and provider-switch races
//! deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::StorageError;
use crate::storage::{
    filter_and_sort, Capabilities, DirectoryEntry, EntryId, ProviderKind, SaveTarget,
    StorageProvider,
};

pub(crate) struct MemoryProvider {
    caps: Capabilities,
    root: Option<EntryId>,
    folders: Mutex<HashMap<String, Vec<DirectoryEntry>>>,
    files: Mutex<HashMap<String, String>>,
    parents: Mutex<HashMap<String, Option<String>>>,
    list_gates: Mutex<HashMap<String, Arc<Notify>>>,
    read_gate: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicUsize,
    read_calls: AtomicUsize,
    fail_listing: AtomicBool,
    next_id: AtomicUsize,
    save_dialog_script: Mutex<Vec<Option<SaveTarget>>>,
}

impl MemoryProvider {
    pub(crate) fn new() -> Self {
        Self {
            caps: Capabilities {
                read: true,
                write: true,
                create: true,
                create_folder: true,
                parent_lookup: true,
                root_folder: true,
                open_dialog: false,
                save_dialog: false,
            },
            root: Some(EntryId::new("root")),
            folders: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
            parents: Mutex::new(HashMap::new()),
            list_gates: Mutex::new(HashMap::new()),
            read_gate: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
            fail_listing: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
            save_dialog_script: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_caps(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub(crate) fn without_root(mut self) -> Self {
        self.root = None;
        self.caps.root_folder = false;
        self
    }

    pub(crate) fn add_folder(&self, id: &str, name: &str, parent: Option<&str>) {
        self.folders.lock().unwrap().entry(id.to_string()).or_default();
        self.parents
            .lock()
            .unwrap()
            .insert(id.to_string(), parent.map(str::to_string));
        if let Some(parent) = parent {
            self.folders
                .lock()
                .unwrap()
                .entry(parent.to_string())
                .or_default()
                .push(DirectoryEntry {
                    id: EntryId::new(id),
                    name: name.to_string(),
                    is_directory: true,
                });
        }
    }

    pub(crate) fn add_file(&self, folder: &str, id: &str, name: &str, content: &str) -> EntryId {
        self.files
            .lock()
            .unwrap()
            .insert(id.to_string(), content.to_string());
        self.parents
            .lock()
            .unwrap()
            .insert(id.to_string(), Some(folder.to_string()));
        self.folders
            .lock()
            .unwrap()
            .entry(folder.to_string())
            .or_default()
            .push(DirectoryEntry {
                id: EntryId::new(id),
                name: name.to_string(),
                is_directory: false,
            });
        EntryId::new(id)
    }

    /// Make the next listings of `folder` block until the returned gate is
    /// notified.
    pub(crate) fn gate_listing(&self, folder: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.list_gates
            .lock()
            .unwrap()
            .insert(folder.to_string(), Arc::clone(&gate));
        gate
    }

    /// Make the next reads block until the returned gate is notified.
    pub(crate) fn gate_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.read_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn fail_listings(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Queue a result for the next `show_save_dialog` call.
    pub(crate) fn script_save_dialog(&self, target: Option<SaveTarget>) {
        self.save_dialog_script.lock().unwrap().push(target);
    }

    pub(crate) fn file_content(&self, id: &str) -> Option<String> {
        self.files.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn list_directory(&self, folder: &EntryId) -> Result<Vec<DirectoryEntry>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.list_gates.lock().unwrap().remove(folder.as_str());
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StorageError::Io("listing unavailable".to_string()));
        }

        let entries = self
            .folders
            .lock()
            .unwrap()
            .get(folder.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(filter_and_sort(entries))
    }

    async fn read_file(&self, id: &EntryId) -> Result<String, StorageError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.read_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.files
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn write_file(&self, id: &EntryId, content: &str) -> Result<(), StorageError> {
        self.files
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), content.to_string());
        Ok(())
    }

    async fn create_file(
        &self,
        parent: &EntryId,
        name: &str,
        content: &str,
    ) -> Result<EntryId, StorageError> {
        // Backend-assigned identity, deliberately unrelated to `name`.
        let id = format!("obj-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(self.add_file(parent.as_str(), &id, name, content))
    }

    async fn create_folder(&self, parent: &EntryId, name: &str) -> Result<EntryId, StorageError> {
        let id = format!("dir-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.add_folder(&id, name, Some(parent.as_str()));
        Ok(EntryId::new(id))
    }

    async fn parent_folder(&self, id: &EntryId) -> Result<Option<EntryId>, StorageError> {
        Ok(self
            .parents
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .unwrap_or(None)
            .map(EntryId::new))
    }

    async fn root_folder(&self) -> Result<EntryId, StorageError> {
        self.root
            .clone()
            .ok_or_else(|| StorageError::capability("No root folder available."))
    }

    async fn show_save_dialog(
        &self,
        _default_name: &str,
    ) -> Result<Option<SaveTarget>, StorageError> {
        let mut script = self.save_dialog_script.lock().unwrap();
        if script.is_empty() {
            return Ok(None);
        }
        Ok(script.remove(0))
    }
}
