//! Bound values: one key, one backend, one codec, curried.
//!
//! A `BoundValue` lets multiple independent call sites share a logical
//! value without re-stating its key, default, or codec. Cloning the
//! handle is cheap and every clone addresses the same underlying state.

use std::sync::Arc;

use synckv_core::{DefaultValue, StorageBackend};

use crate::options::StoreOptions;
use crate::store::Store;
use crate::subscription::Subscription;

/// The `{get, set, remove, subscribe}` bundle for one key/backend/codec
/// combination.
pub struct BoundValue<T> {
    store: Store,
    key: String,
    default: DefaultValue<T>,
    options: StoreOptions<T>,
}

impl<T: Send + Sync + 'static> BoundValue<T> {
    pub(crate) fn new(
        store: Store,
        key: String,
        default: DefaultValue<T>,
        options: StoreOptions<T>,
    ) -> Self {
        // Factory defaults are resolved once, at bind time, not per read.
        let _ = default.resolve();
        Self {
            store,
            key,
            default,
            options,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The backend this value is bound to, or `None` for the in-memory
    /// fallback.
    pub fn backend(&self) -> Option<&Arc<dyn StorageBackend>> {
        self.options.backend()
    }

    /// The current decoded value, or the bound default.
    pub fn get(&self) -> Arc<T> {
        self.store.get(&self.key, &self.default, &self.options)
    }

    /// Encode, persist, and notify. Write-and-forget on persist failure.
    pub fn set(&self, value: &T) {
        self.store.set(&self.key, value, &self.options);
    }

    /// Caller-computed update: read the current value, apply `update`,
    /// write the result. There is no cross-context atomicity here; the
    /// backend's write ordering is the only guarantee.
    pub fn set_with(&self, update: impl FnOnce(&T) -> T) {
        let current = self.get();
        self.set(&update(&current));
    }

    /// Delete the stored value; readers fall back to the bound default.
    pub fn remove(&self) {
        self.store.remove(&self.key, &self.options);
    }

    /// Subscribe to changes, receiving the resolved decoded value.
    pub fn subscribe(&self, on_change: impl Fn(Arc<T>) + Send + Sync + 'static) -> Subscription {
        self.store
            .subscribe(&self.key, self.default.clone(), &self.options, on_change)
    }

    /// The bound default, as used before any backend state exists.
    pub(crate) fn default_value(&self) -> Arc<T> {
        self.default.resolve()
    }
}

impl<T> Clone for BoundValue<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            default: self.default.clone(),
            options: self.options.clone(),
        }
    }
}

impl<T> std::fmt::Debug for BoundValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundValue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
