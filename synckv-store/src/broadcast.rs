//! In-process change broadcaster.
//!
//! A publish/subscribe registry keyed by scoped key. Local writers notify
//! through it immediately after persisting, without waiting for the
//! backend's own (other-context-only) change notification; the bridge
//! re-dispatches cross-context events into the same registry so all
//! subscribers observe one uniform notification path.
//!
//! Fan-out iterates a snapshot of the callback list taken under the lock,
//! then invokes callbacks with no lock held: subscribing or unsubscribing
//! from inside a callback is safe and cannot skip or double-invoke
//! unrelated callbacks. A panicking callback is isolated and logged; the
//! remaining callbacks still run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use synckv_core::ScopedKey;

/// Callback invoked with the new raw value (`None` for a deletion).
pub(crate) type ChangeCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Per-scoped-key callback registry.
pub(crate) struct Broadcaster {
    subscribers: RwLock<HashMap<ScopedKey, Vec<ChangeCallback>>>,
}

impl Broadcaster {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a callback for a scoped key. Idempotent per `Arc`
    /// identity: registering the same callback twice keeps one entry.
    /// Returns false on a duplicate.
    pub(crate) fn register(&self, scoped: &ScopedKey, callback: &ChangeCallback) -> bool {
        let mut subscribers = self.subscribers.write().expect("subscriber lock poisoned");
        let entries = subscribers.entry(scoped.clone()).or_default();
        if entries.iter().any(|existing| Arc::ptr_eq(existing, callback)) {
            return false;
        }
        entries.push(Arc::clone(callback));
        true
    }

    /// Remove a callback by `Arc` identity. Returns false when it was not
    /// registered (repeated removal is a no-op, not an error).
    pub(crate) fn deregister(&self, scoped: &ScopedKey, callback: &ChangeCallback) -> bool {
        let mut subscribers = self.subscribers.write().expect("subscriber lock poisoned");
        let Some(entries) = subscribers.get_mut(scoped) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|existing| !Arc::ptr_eq(existing, callback));
        before != entries.len()
    }

    /// Invoke every callback registered for a scoped key, synchronously,
    /// in registration order.
    pub(crate) fn fan_out(&self, scoped: &ScopedKey, new_raw: Option<&str>) {
        let snapshot: Vec<ChangeCallback> = {
            let subscribers = self.subscribers.read().expect("subscriber lock poisoned");
            match subscribers.get(scoped) {
                Some(entries) => entries.clone(),
                None => return,
            }
        };

        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(new_raw))).is_err() {
                tracing::error!(scoped_key = %scoped, "subscriber panicked during fan-out");
            }
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self, scoped: &ScopedKey) -> usize {
        self.subscribers
            .read()
            .expect("subscriber lock poisoned")
            .get(scoped)
            .map_or(0, Vec::len)
    }
}
