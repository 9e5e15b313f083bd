//! Cross-context bridge.
//!
//! Listens for the backend's native change notification, which fires only
//! in contexts *other* than the writer, and re-dispatches it into the
//! change broadcaster. One native listener is registered per backend, not
//! per key (the underlying notification is not key-scoped), and it is
//! reference-counted across subscriptions: N subscribers on the same
//! backend share one listener, registered when the first arrives and
//! dropped when the last leaves.
//!
//! The listener filters on the event's originating backend identity;
//! key filtering is the broadcaster's exact scoped-key dispatch, so
//! unrelated keys changing reach no callbacks (their cache entries are
//! still evicted, keeping readers coherent).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use synckv_core::{BackendId, BackendKind, ChangeEvent, ChangeListener, ScopedKey, StorageBackend, WatchGuard};

use crate::registry::Registry;

struct Watcher {
    refs: usize,
    _guard: WatchGuard,
}

/// Reference-counted native watchers, one per persistent backend.
pub(crate) struct Bridge {
    watchers: Mutex<HashMap<BackendId, Watcher>>,
}

impl Bridge {
    pub(crate) fn new() -> Self {
        Self {
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Account for one more subscription on `backend`, installing the
    /// native listener if this is the first. Memory backends have no
    /// cross-context events and are never watched.
    pub(crate) fn retain(&self, registry: &Arc<Registry>, backend: &Arc<dyn StorageBackend>) {
        if backend.kind() != BackendKind::Persistent {
            return;
        }

        let id = backend.backend_id();
        let mut watchers = self.watchers.lock().expect("bridge lock poisoned");
        if let Some(watcher) = watchers.get_mut(&id) {
            watcher.refs += 1;
            return;
        }

        let registry = Arc::downgrade(registry);
        let listener: ChangeListener = Arc::new(move |event: &ChangeEvent| {
            forward(&registry, id, event);
        });
        let guard = backend.watch(listener);
        watchers.insert(id, Watcher { refs: 1, _guard: guard });
    }

    /// Account for one subscription leaving `backend_id`; drops the
    /// native listener when the last one leaves.
    pub(crate) fn release(&self, backend_id: BackendId) {
        let mut watchers = self.watchers.lock().expect("bridge lock poisoned");
        let Some(watcher) = watchers.get_mut(&backend_id) else {
            return;
        };
        watcher.refs -= 1;
        if watcher.refs == 0 {
            watchers.remove(&backend_id);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_watching(&self, backend_id: BackendId) -> bool {
        self.watchers
            .lock()
            .expect("bridge lock poisoned")
            .contains_key(&backend_id)
    }
}

/// Re-dispatch a native event into the broadcaster: evict the cache entry
/// for the event's scoped key, then notify subscribers with the new raw
/// value (`None` for a deletion).
fn forward(registry: &Weak<Registry>, watched: BackendId, event: &ChangeEvent) {
    if event.source != watched {
        return;
    }
    let Some(registry) = registry.upgrade() else {
        return;
    };
    let scoped = ScopedKey::new(watched, event.key.as_str());
    registry.dispatch(&scoped, event.new_value.as_deref());
}
