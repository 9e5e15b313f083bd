//! Subscription handles.
//!
//! Unsubscribing is the only cancellation operation: it takes effect
//! immediately (no further callback invocations after it returns) and is
//! idempotent. Dropping the last handle for a subscription also
//! unsubscribes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use synckv_core::{BackendId, ScopedKey};

use crate::broadcast::ChangeCallback;
use crate::registry::Registry;

/// Handle to an active subscription.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

struct SubscriptionInner {
    registry: Weak<Registry>,
    scoped: ScopedKey,
    callback: ChangeCallback,
    backend_id: BackendId,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        registry: Weak<Registry>,
        scoped: ScopedKey,
        callback: ChangeCallback,
        backend_id: BackendId,
    ) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                registry,
                scoped,
                callback,
                backend_id,
                active: AtomicBool::new(true),
            }),
        }
    }

    /// Stop delivering notifications. Effective immediately; calling it
    /// again is a no-op.
    pub fn unsubscribe(&self) {
        self.inner.release();
    }

    /// Whether this subscription is still delivering notifications.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// The scoped key this subscription listens on.
    pub fn scoped_key(&self) -> &ScopedKey {
        &self.inner.scoped
    }
}

impl SubscriptionInner {
    fn release(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry.broadcaster().deregister(&self.scoped, &self.callback);
        registry.bridge().release(self.backend_id);
    }
}

impl Drop for SubscriptionInner {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("scoped_key", &self.inner.scoped)
            .field("active", &self.is_active())
            .finish()
    }
}
