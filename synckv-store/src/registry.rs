//! Process-level registry owning the synchronization state.
//!
//! The cache, the subscriber sets, the bridge watchers, the warning
//! ledger, and the in-memory fallback map all live here, constructed once
//! and passed by `Arc` to [`Store`](crate::store::Store) instances. The
//! shared registry accessor gives every store the same state, which is
//! what lets one logical value be shared by independent call sites; a
//! private registry isolates state for tests.

use once_cell::sync::Lazy;
use std::sync::Arc;

use synckv_core::{ScopedKey, StorageBackend};

use crate::backend::MemoryBackend;
use crate::bridge::Bridge;
use crate::broadcast::Broadcaster;
use crate::cache::ValueCache;

static SHARED: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// Owner of all per-process synchronization state.
pub struct Registry {
    cache: ValueCache,
    broadcaster: Broadcaster,
    bridge: Bridge,
    memory: Arc<MemoryBackend>,
}

impl Registry {
    /// A fresh registry with its own cache, subscriber sets, and
    /// in-memory fallback map.
    pub fn new() -> Self {
        Self {
            cache: ValueCache::new(),
            broadcaster: Broadcaster::new(),
            bridge: Bridge::new(),
            memory: Arc::new(MemoryBackend::new()),
        }
    }

    /// The process-wide registry. Stores built on it share cached values,
    /// notifications, and the in-memory fallback map.
    pub fn shared() -> Arc<Registry> {
        Arc::clone(&SHARED)
    }

    /// The in-memory fallback backend used when no persistent backend is
    /// configured.
    pub(crate) fn memory_backend(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.memory) as Arc<dyn StorageBackend>
    }

    /// Evict the cache entry for a scoped key, then notify its
    /// subscribers. The eviction-before-fan-out order is load-bearing: a
    /// subscriber re-reading during its own callback must observe the new
    /// value, never a stale one.
    pub(crate) fn dispatch(&self, scoped: &ScopedKey, new_raw: Option<&str>) {
        self.cache.evict(scoped);
        self.broadcaster.fan_out(scoped, new_raw);
    }

    pub(crate) fn cache(&self) -> &ValueCache {
        &self.cache
    }

    pub(crate) fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub(crate) fn bridge(&self) -> &Bridge {
        &self.bridge
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
