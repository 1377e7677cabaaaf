//! Document identity, dirty tracking, and the open/save lifecycle

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{ErrorSink, LogErrorSink, StorageError};
use crate::storage::registry::ProviderRegistry;
use crate::storage::{EntryId, SaveTarget};

/// In-memory state of the open document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Backend-scoped identifier; `None` until the document is first
    /// saved.
    pub identity: Option<EntryId>,
    /// Human-readable name independent of `identity` (a cloud id is not
    /// legible).
    pub display_name: Option<String>,
    /// Current text buffer.
    pub content: String,
    /// Content as of the last successful read or write.
    pub saved_snapshot: String,
    /// Cached result of `content != saved_snapshot`; recomputed on every
    /// content change.
    pub dirty: bool,
}

impl Document {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Title shown in the window chrome: display name, else the identity
    /// basename, else "Untitled", with a dirty marker appended.
    pub fn title(&self) -> String {
        let base = self
            .display_name
            .clone()
            .or_else(|| self.identity.as_ref().map(|id| id.basename().to_string()))
            .unwrap_or_else(|| "Untitled".to_string());
        if self.dirty {
            format!("{base} *")
        } else {
            base
        }
    }

    fn default_save_name(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.identity.as_ref().map(|id| id.basename().to_string()))
            .unwrap_or_else(|| "Untitled.md".to_string())
    }
}

/// Notifications for the title bar and any recent-files recorder.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    DirtyChanged(bool),
    DocumentChanged {
        identity: Option<EntryId>,
        display_name: Option<String>,
    },
}

/// How a lifecycle operation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Completed,
    /// The user dismissed a dialog; nothing changed.
    Cancelled,
    /// The active provider was switched while the operation was in
    /// flight; its result was ignored.
    Discarded,
}

/// Caller-supplied naming flow for save-as when the active backend has no
/// save dialog capability (e.g. the cloud backend, whose target picker is
/// part of the host UI).
#[async_trait]
pub trait SavePrompt: Send + Sync {
    async fn pick_save_target(
        &self,
        default_name: &str,
    ) -> Result<Option<SaveTarget>, StorageError>;
}

/// Owns the open document and orchestrates new/open/save/save-as/refresh
/// through the active storage provider.
///
/// Cheaply cloneable; clones share the same document state. Failed
/// operations leave the document exactly as it was before the call.
#[derive(Clone)]
pub struct DocumentManager {
    registry: ProviderRegistry,
    state: Arc<Mutex<Document>>,
    events: broadcast::Sender<DocumentEvent>,
    sink: Arc<dyn ErrorSink>,
    save_prompt: Option<Arc<dyn SavePrompt>>,
}

impl DocumentManager {
    pub fn new(registry: ProviderRegistry) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            registry,
            state: Arc::new(Mutex::new(Document::default())),
            events,
            sink: Arc::new(LogErrorSink),
            save_prompt: None,
        }
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_save_prompt(mut self, prompt: Arc<dyn SavePrompt>) -> Self {
        self.save_prompt = Some(prompt);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current document state.
    pub fn document(&self) -> Document {
        self.state.lock().unwrap().clone()
    }

    pub fn title(&self) -> String {
        self.state.lock().unwrap().title()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().unwrap().dirty
    }

    /// Start a fresh unsaved document.
    pub fn new_document(&self) {
        let was_dirty = {
            let mut doc = self.state.lock().unwrap();
            let was_dirty = doc.dirty;
            *doc = Document::default();
            was_dirty
        };
        if was_dirty {
            let _ = self.events.send(DocumentEvent::DirtyChanged(false));
        }
        let _ = self.events.send(DocumentEvent::DocumentChanged {
            identity: None,
            display_name: None,
        });
    }

    /// Feed an edit from the editing surface. Recomputes the dirty flag
    /// from the snapshot comparison — an undo that lands back on the
    /// snapshot makes the document clean again.
    pub fn set_content(&self, content: &str) {
        let transition = {
            let mut doc = self.state.lock().unwrap();
            if doc.content == content {
                None
            } else {
                doc.content.clear();
                doc.content.push_str(content);
                let dirty = doc.content != doc.saved_snapshot;
                if dirty != doc.dirty {
                    doc.dirty = dirty;
                    Some(dirty)
                } else {
                    None
                }
            }
        };
        if let Some(dirty) = transition {
            let _ = self.events.send(DocumentEvent::DirtyChanged(dirty));
        }
    }

    /// Open a file, replacing identity, content, and snapshot atomically.
    /// On failure the previous document is untouched.
    pub async fn open(
        &self,
        id: EntryId,
        display_name: Option<String>,
    ) -> Result<OpStatus, StorageError> {
        let (provider, generation) = self.registry.active();

        let content = match provider.read_file(&id).await {
            Ok(content) => content,
            Err(err) => {
                self.surface(&err);
                return Err(err);
            }
        };

        if !self.registry.is_current(generation) {
            return Ok(OpStatus::Discarded);
        }

        let (was_dirty, changed_to) = {
            let mut doc = self.state.lock().unwrap();
            let was_dirty = doc.dirty;
            doc.identity = Some(id.clone());
            doc.display_name = display_name.clone();
            doc.content = content.clone();
            doc.saved_snapshot = content;
            doc.dirty = false;
            (was_dirty, doc.display_name.clone())
        };

        if was_dirty {
            let _ = self.events.send(DocumentEvent::DirtyChanged(false));
        }
        let _ = self.events.send(DocumentEvent::DocumentChanged {
            identity: Some(id),
            display_name: changed_to,
        });
        tracing::info!("Opened document");
        Ok(OpStatus::Completed)
    }

    /// Save to the current identity, or delegate to save-as when the
    /// document has never been saved.
    pub async fn save(&self) -> Result<OpStatus, StorageError> {
        let (identity, content) = {
            let doc = self.state.lock().unwrap();
            (doc.identity.clone(), doc.content.clone())
        };

        let Some(identity) = identity else {
            return self.save_as().await;
        };

        let (provider, generation) = self.registry.active();
        if let Err(err) = provider.write_file(&identity, &content).await {
            self.surface(&err);
            return Err(err);
        }

        if !self.registry.is_current(generation) {
            return Ok(OpStatus::Discarded);
        }

        self.commit_saved(content, None, None);
        Ok(OpStatus::Completed)
    }

    /// Pick a target (backend dialog or the configured prompt) and write
    /// the document there, adopting the resulting identity.
    pub async fn save_as(&self) -> Result<OpStatus, StorageError> {
        let (provider, generation) = self.registry.active();
        let (content, default_name) = {
            let doc = self.state.lock().unwrap();
            (doc.content.clone(), doc.default_save_name())
        };

        let target = if provider.capabilities().save_dialog {
            match provider.show_save_dialog(&default_name).await {
                Ok(target) => target,
                Err(err) => {
                    self.surface(&err);
                    return Err(err);
                }
            }
        } else if let Some(ref prompt) = self.save_prompt {
            match prompt.pick_save_target(&default_name).await {
                Ok(target) => target,
                Err(StorageError::Cancelled) => None,
                Err(err) => {
                    self.surface(&err);
                    return Err(err);
                }
            }
        } else {
            let err = StorageError::capability("Saving is not available here.");
            self.surface(&err);
            return Err(err);
        };

        let Some(target) = target else {
            return Ok(OpStatus::Cancelled);
        };

        let (new_identity, new_display_name) = match target {
            SaveTarget::Existing(id) => {
                if let Err(err) = provider.write_file(&id, &content).await {
                    self.surface(&err);
                    return Err(err);
                }
                (id, None)
            }
            SaveTarget::New { parent, name } => {
                match provider.create_file(&parent, &name, &content).await {
                    Ok(id) => (id, Some(name)),
                    Err(err) => {
                        self.surface(&err);
                        return Err(err);
                    }
                }
            }
        };

        if !self.registry.is_current(generation) {
            return Ok(OpStatus::Discarded);
        }

        self.commit_saved(content, Some(new_identity), Some(new_display_name));
        Ok(OpStatus::Completed)
    }

    /// Re-open the current identity, discarding uncommitted edits.
    pub async fn refresh(&self) -> Result<OpStatus, StorageError> {
        let (identity, display_name) = {
            let doc = self.state.lock().unwrap();
            (doc.identity.clone(), doc.display_name.clone())
        };

        let Some(identity) = identity else {
            let err = StorageError::capability("No file is open to refresh.");
            self.surface(&err);
            return Err(err);
        };

        self.open(identity, display_name).await
    }

    /// Commit a successful write: the written content becomes the
    /// snapshot, and identity/display name are adopted when save-as
    /// assigned them.
    fn commit_saved(
        &self,
        written: String,
        identity: Option<EntryId>,
        display_name: Option<Option<String>>,
    ) {
        let (transition, changed) = {
            let mut doc = self.state.lock().unwrap();
            let identity_changed = match identity {
                Some(id) => {
                    let changed = doc.identity.as_ref() != Some(&id);
                    doc.identity = Some(id);
                    changed
                }
                None => false,
            };
            if let Some(name) = display_name {
                doc.display_name = name;
            }
            doc.saved_snapshot = written;
            let dirty = doc.content != doc.saved_snapshot;
            let transition = if dirty != doc.dirty {
                doc.dirty = dirty;
                Some(dirty)
            } else {
                None
            };
            let changed = identity_changed.then(|| DocumentEvent::DocumentChanged {
                identity: doc.identity.clone(),
                display_name: doc.display_name.clone(),
            });
            (transition, changed)
        };

        if let Some(dirty) = transition {
            let _ = self.events.send(DocumentEvent::DirtyChanged(dirty));
        }
        if let Some(event) = changed {
            let _ = self.events.send(event);
        }
        tracing::info!("Saved document");
    }

    fn surface(&self, err: &StorageError) {
        if !err.is_cancelled() {
            self.sink.report_error(&err.to_string());
        }
    }
}
