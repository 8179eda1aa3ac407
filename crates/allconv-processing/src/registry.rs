//! Resource registry
//!
//! Issues [`ResourceRef`] handles for byte payloads (previews, converted artifacts,
//! temporary originals) and keeps the payload alive until the handle is released.

use allconv_core::ResourceRef;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct Resource {
    pub data: Bytes,
    pub mime_type: String,
}

/// Shared table of live resources. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: Arc<Mutex<HashMap<ResourceRef, Resource>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ResourceRef, Resource>> {
        // Every critical section is a single map operation, so poisoning is ignored.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register(&self, data: Bytes, mime_type: impl Into<String>) -> ResourceRef {
        let reference = ResourceRef::new();
        self.entries().insert(
            reference,
            Resource {
                data,
                mime_type: mime_type.into(),
            },
        );
        tracing::trace!(%reference, "Resource registered");
        reference
    }

    pub fn resolve(&self, reference: &ResourceRef) -> Option<Resource> {
        self.entries().get(reference).cloned()
    }

    /// Releases `reference`. Returns false when it was not live.
    pub fn release(&self, reference: &ResourceRef) -> bool {
        let released = self.entries().remove(reference).is_some();
        if released {
            tracing::trace!(%reference, "Resource released");
        }
        released
    }

    pub fn release_all(&self, references: impl IntoIterator<Item = ResourceRef>) -> usize {
        let mut entries = self.entries();
        references
            .into_iter()
            .filter(|r| entries.remove(r).is_some())
            .count()
    }

    pub fn is_live(&self, reference: &ResourceRef) -> bool {
        self.entries().contains_key(reference)
    }

    pub fn live_count(&self) -> usize {
        self.entries().len()
    }
}
