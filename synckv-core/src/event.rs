//! Storage backend contract and native change events.
//!
//! `StorageBackend` is the interface the embedding application implements
//! over its persistent key-value store. The store engine treats it and
//! the in-memory fallback uniformly; which one backs a store instance is
//! decided once at options construction, never branched per call.

use crate::error::StorageError;
use crate::identity::{BackendId, BackendKind};
use std::fmt;
use std::sync::Arc;

/// A native change notification from the backend.
///
/// Delivered only to contexts *other* than the writer; the writing
/// context notifies its own subscribers directly after persisting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The key that changed.
    pub key: String,
    /// The new raw value, or `None` for a deletion.
    pub new_value: Option<String>,
    /// Identity of the backend the event originated from, as seen by the
    /// receiving context.
    pub source: BackendId,
}

/// Callback invoked with native change events.
pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Guard returned by [`StorageBackend::watch`]; dropping it deregisters
/// the native listener.
pub struct WatchGuard {
    unwatch: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchGuard {
    /// A guard that runs `unwatch` when dropped.
    pub fn new(unwatch: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unwatch: Some(Box::new(unwatch)),
        }
    }

    /// A guard with nothing to release. Used by backends that never emit
    /// native events, such as the in-memory fallback.
    pub fn inert() -> Self {
        Self { unwatch: None }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(unwatch) = self.unwatch.take() {
            unwatch();
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("armed", &self.unwatch.is_some())
            .finish()
    }
}

/// Uniform interface over a key-value backend.
///
/// Implemented by the embedding application for its persistent store and
/// by the engine's in-memory fallback. Raw values are opaque strings;
/// absence is `None`.
pub trait StorageBackend: Send + Sync {
    /// Stable identity of this backend instance. Partitions caches and
    /// subscriber registries.
    fn backend_id(&self) -> BackendId;

    /// Whether this backend is persistent or the in-memory fallback.
    fn kind(&self) -> BackendKind;

    /// Read the raw value for a key, or `None` if absent.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write the raw value for a key. May fail (e.g. quota exceeded);
    /// callers in the store treat failure as write-and-forget.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the raw value for a key. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str);

    /// Register a listener for native change events fired by *other*
    /// contexts mutating this backend. Backends with no cross-context
    /// visibility return [`WatchGuard::inert`].
    fn watch(&self, listener: ChangeListener) -> WatchGuard;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_watch_guard_runs_unwatch_on_drop() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let guard = WatchGuard::new(move || flag.store(true, Ordering::SeqCst));
        assert!(!released.load(Ordering::SeqCst));
        drop(guard);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_inert_guard_is_a_noop() {
        let guard = WatchGuard::inert();
        drop(guard);
    }

    #[test]
    fn test_change_event_equality() {
        let source = BackendId::new();
        let a = ChangeEvent {
            key: "counter".to_string(),
            new_value: Some("1".to_string()),
            source,
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
