//! Reactive binding contract for UI integration layers.
//!
//! A rendering framework binds a value through three functions: an
//! invalidation subscription, a snapshot getter whose result is
//! referentially stable between notifications, and a server snapshot used
//! before any backend state is available. The consuming layer never sees
//! an error from decode or persist failures; it always receives a valid
//! value.

use std::sync::Arc;

use crate::bound::BoundValue;
use crate::subscription::Subscription;

/// The subscribe/snapshot contract consumed by reactive UI bindings.
pub trait ReactiveSource<T> {
    /// Register for invalidation. The callback carries no value; the
    /// binding re-reads via [`snapshot`](ReactiveSource::snapshot).
    fn subscribe_invalidation(
        &self,
        on_invalidate: Box<dyn Fn() + Send + Sync>,
    ) -> Subscription;

    /// The current decoded value. Pointer-stable between notifications.
    fn snapshot(&self) -> Arc<T>;

    /// The value to present before any backend is available: always the
    /// bound default.
    fn server_snapshot(&self) -> Arc<T>;
}

impl<T: Send + Sync + 'static> ReactiveSource<T> for BoundValue<T> {
    fn subscribe_invalidation(
        &self,
        on_invalidate: Box<dyn Fn() + Send + Sync>,
    ) -> Subscription {
        self.subscribe(move |_| on_invalidate())
    }

    fn snapshot(&self) -> Arc<T> {
        self.get()
    }

    fn server_snapshot(&self) -> Arc<T> {
        self.default_value()
    }
}
