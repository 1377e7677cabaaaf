//! Active-provider registry
//!
//! Holds exactly one active storage backend at a time. Every switch bumps
//! a generation counter; operations snapshot the generation before their
//! first await and re-check it before committing, so work still in flight
//! against a replaced provider is ignored rather than applied.

use std::sync::{Arc, Mutex};

use crate::storage::{Capabilities, ProviderKind, StorageProvider};

struct ActiveProvider {
    provider: Arc<dyn StorageProvider>,
    generation: u64,
}

/// Shared handle to the single active storage provider.
#[derive(Clone)]
pub struct ProviderRegistry {
    inner: Arc<Mutex<ActiveProvider>>,
}

impl ProviderRegistry {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ActiveProvider {
                provider,
                generation: 0,
            })),
        }
    }

    /// Snapshot the active provider together with the generation it
    /// belongs to.
    pub fn active(&self) -> (Arc<dyn StorageProvider>, u64) {
        let inner = self.inner.lock().unwrap();
        (Arc::clone(&inner.provider), inner.generation)
    }

    pub fn provider(&self) -> Arc<dyn StorageProvider> {
        Arc::clone(&self.inner.lock().unwrap().provider)
    }

    pub fn kind(&self) -> ProviderKind {
        self.inner.lock().unwrap().provider.kind()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.lock().unwrap().provider.capabilities()
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    /// Whether a previously snapshotted generation still identifies the
    /// active provider.
    pub fn is_current(&self, generation: u64) -> bool {
        self.inner.lock().unwrap().generation == generation
    }

    /// Replace the active provider (e.g. guest → cloud after sign-in) and
    /// return the new generation. Navigation state must be reset by the
    /// caller; it is not carried across providers.
    pub fn switch(&self, provider: Arc<dyn StorageProvider>) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        tracing::info!(
            "Switching storage provider to {} (generation {})",
            provider.kind(),
            inner.generation
        );
        inner.provider = provider;
        inner.generation
    }
}
