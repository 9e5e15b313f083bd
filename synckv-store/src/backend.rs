//! In-memory fallback backend.
//!
//! Used when no persistent backend is configured. Lives inside the
//! [`Registry`](crate::registry::Registry), so with the shared registry
//! the map is process-wide; it is never visible to other processes and
//! therefore never emits native change events.

use std::collections::HashMap;
use std::sync::RwLock;

use synckv_core::{
    BackendId, BackendKind, ChangeListener, StorageBackend, StorageError, WatchGuard,
};

/// Process-local key-value map satisfying the same interface as a
/// persistent backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. Exposed for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.entries.read().expect("memory backend lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryBackend {
    fn backend_id(&self) -> BackendId {
        BackendId::memory()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("memory backend lock poisoned")
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .expect("memory backend lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.entries
            .write()
            .expect("memory backend lock poisoned")
            .remove(key);
    }

    fn watch(&self, _listener: ChangeListener) -> WatchGuard {
        // Process-local state has no other contexts to hear from.
        WatchGuard::inert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get_item("counter"), None);

        backend.set_item("counter", "1").expect("set should succeed");
        assert_eq!(backend.get_item("counter"), Some("1".to_string()));

        backend.remove_item("counter");
        assert_eq!(backend.get_item("counter"), None);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let backend = MemoryBackend::new();
        backend.remove_item("never-set");
        assert!(backend.is_empty());
    }

    #[test]
    fn test_identity_is_memory_sentinel() {
        let backend = MemoryBackend::new();
        assert!(backend.backend_id().is_memory());
        assert_eq!(backend.kind(), BackendKind::Memory);
    }

    #[test]
    fn test_watch_is_inert() {
        let backend = MemoryBackend::new();
        let guard = backend.watch(std::sync::Arc::new(|_| {
            panic!("memory backend must not deliver events");
        }));
        backend.set_item("counter", "1").expect("set should succeed");
        drop(guard);
    }
}
