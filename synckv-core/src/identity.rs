//! Identity types: backend identity and backend-scoped keys.
//!
//! The key insight is that `ScopedKey`'s constructor requires a
//! `BackendId`, so no cache or subscriber-registry operation can be
//! expressed without naming the backend partition it belongs to. Two
//! backends (or a backend and the in-memory fallback) never share cached
//! values or notifications, even under the same key string.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a storage backend instance.
///
/// Uses UUIDv7 so ids are timestamp-sortable, matching the rest of the
/// id space. The nil UUID is reserved as the "no backend" sentinel for
/// the process-local in-memory fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendId(Uuid);

impl BackendId {
    /// Mint a fresh identity for a persistent backend instance.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The "no backend" sentinel identifying the in-memory fallback.
    pub const fn memory() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this identity is the in-memory sentinel.
    pub fn is_memory(&self) -> bool {
        self.0.is_nil()
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BackendId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_memory() {
            write!(f, "memory")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Kind of storage backing a store instance, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Backed by an external persistent key-value store shared across
    /// contexts.
    Persistent,
    /// Backed by the process-local in-memory fallback map.
    Memory,
}

/// A key scoped to a backend partition.
///
/// # Design
///
/// The private inner struct ensures a `ScopedKey` can ONLY be constructed
/// via `new()`, which requires a `BackendId`. Cache entries and
/// subscriber sets are therefore partitioned by backend identity by
/// construction, not by a runtime check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    inner: ScopedKeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScopedKeyInner {
    backend: BackendId,
    key: String,
}

impl ScopedKey {
    /// Create a key scoped to the given backend partition.
    pub fn new(backend: BackendId, key: impl Into<String>) -> Self {
        Self {
            inner: ScopedKeyInner {
                backend,
                key: key.into(),
            },
        }
    }

    /// The backend partition this key belongs to.
    pub fn backend_id(&self) -> BackendId {
        self.inner.backend
    }

    /// The key string within the backend namespace.
    pub fn key(&self) -> &str {
        &self.inner.key
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.inner.backend, self.inner.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sentinel_is_nil() {
        let id = BackendId::memory();
        assert!(id.is_memory());
        assert_eq!(id.as_uuid(), Uuid::nil());
    }

    #[test]
    fn test_fresh_ids_are_distinct() {
        let a = BackendId::new();
        let b = BackendId::new();
        assert_ne!(a, b);
        assert!(!a.is_memory());
    }

    #[test]
    fn test_scoped_key_getters() {
        let backend = BackendId::new();
        let key = ScopedKey::new(backend, "counter");
        assert_eq!(key.backend_id(), backend);
        assert_eq!(key.key(), "counter");
    }

    #[test]
    fn test_same_key_different_backends_are_different() {
        let a = ScopedKey::new(BackendId::new(), "counter");
        let b = ScopedKey::new(BackendId::new(), "counter");
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_key_memory_vs_persistent_are_different() {
        let persistent = ScopedKey::new(BackendId::new(), "counter");
        let memory = ScopedKey::new(BackendId::memory(), "counter");
        assert_ne!(persistent, memory);
    }

    #[test]
    fn test_same_backend_different_keys_are_different() {
        let backend = BackendId::new();
        let a = ScopedKey::new(backend, "left");
        let b = ScopedKey::new(backend, "right");
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let memory = ScopedKey::new(BackendId::memory(), "counter");
        assert_eq!(memory.to_string(), "memory/counter");
    }
}
