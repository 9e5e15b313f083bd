//! Store API: get, set, remove, subscribe, bind.
//!
//! Composes the codec, the backend, the value cache, the broadcaster, and
//! the bridge. From the caller's point of view `set` and `remove` always
//! succeed: persist failures (e.g. quota) are logged and swallowed,
//! write-and-forget, and a later `get` reflects the backend's true state
//! rather than the attempted value.

use std::sync::Arc;

use synckv_core::{DefaultValue, ScopedKey};

use crate::bound::BoundValue;
use crate::broadcast::ChangeCallback;
use crate::options::StoreOptions;
use crate::registry::Registry;
use crate::subscription::Subscription;

/// Handle to the store API over one registry.
#[derive(Clone)]
pub struct Store {
    registry: Arc<Registry>,
}

impl Store {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// A store over the process-wide registry.
    pub fn shared() -> Self {
        Self::new(Registry::shared())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Encode and persist a value, then notify same-context subscribers.
    ///
    /// Never fails from the caller's point of view. Encode and persist
    /// failures are logged; subscribers are still notified after a failed
    /// persist and re-read the backend's true state through the cache.
    pub fn set<T>(&self, key: &str, value: &T, options: &StoreOptions<T>) {
        let raw = match options.codec().encode(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "dropping write, value failed to encode");
                return;
            }
        };

        let backend = options.resolve_backend(&self.registry);
        if let Err(err) = backend.set_item(key, &raw) {
            tracing::warn!(key, error = %err, "dropping write, backend rejected it");
        }

        let scoped = ScopedKey::new(backend.backend_id(), key);
        self.registry.dispatch(&scoped, Some(&raw));
    }

    /// The current decoded value for a key, or the default when the key
    /// is absent, unset, or undecodable. Pure with respect to repeated
    /// calls between notifications, including pointer identity of the
    /// returned `Arc`.
    pub fn get<T: Send + Sync + 'static>(
        &self,
        key: &str,
        default: &DefaultValue<T>,
        options: &StoreOptions<T>,
    ) -> Arc<T> {
        let backend = options.resolve_backend(&self.registry);
        self.registry
            .cache()
            .resolve(backend.as_ref(), key, options.codec(), default)
    }

    /// Delete the raw value for a key, then notify subscribers with a
    /// deletion. Removing an absent key is a no-op at the backend and
    /// still notifies, which is harmless: readers resolve the default
    /// either way.
    pub fn remove<T>(&self, key: &str, options: &StoreOptions<T>) {
        let backend = options.resolve_backend(&self.registry);
        backend.remove_item(key);

        let scoped = ScopedKey::new(backend.backend_id(), key);
        self.registry.dispatch(&scoped, None);
    }

    /// Subscribe to changes of a key. On every notification, local or
    /// bridged from another context, the current decoded value is
    /// re-resolved through the cache and handed to `on_change`:
    /// subscribers never see raw change events and are insulated from
    /// decode failures, which fall back to the default.
    pub fn subscribe<T: Send + Sync + 'static>(
        &self,
        key: &str,
        default: DefaultValue<T>,
        options: &StoreOptions<T>,
        on_change: impl Fn(Arc<T>) + Send + Sync + 'static,
    ) -> Subscription {
        let backend = options.resolve_backend(&self.registry);
        let scoped = ScopedKey::new(backend.backend_id(), key);

        let registry = Arc::downgrade(&self.registry);
        let codec = options.codec().clone();
        let reader_backend = Arc::clone(&backend);
        let owned_key = key.to_string();
        let callback: ChangeCallback = Arc::new(move |_new_raw| {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let value =
                registry
                    .cache()
                    .resolve(reader_backend.as_ref(), &owned_key, &codec, &default);
            on_change(value);
        });

        self.registry.broadcaster().register(&scoped, &callback);
        self.registry.bridge().retain(&self.registry, &backend);

        Subscription::new(
            Arc::downgrade(&self.registry),
            scoped,
            callback,
            backend.backend_id(),
        )
    }

    /// Curry key, default, backend, and codec into a [`BoundValue`],
    /// letting independent call sites share one logical value without
    /// re-stating its configuration. The default is resolved once here.
    pub fn bind<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        default: DefaultValue<T>,
        options: StoreOptions<T>,
    ) -> BoundValue<T> {
        BoundValue::new(self.clone(), key.into(), default, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn store() -> Store {
        Store::new(Arc::new(Registry::new()))
    }

    fn default_99() -> DefaultValue<i64> {
        DefaultValue::literal(99)
    }

    #[test]
    fn test_get_before_set_returns_default() {
        let store = store();
        let options = StoreOptions::new();
        assert_eq!(*store.get("counter", &default_99(), &options), 99);
    }

    #[test]
    fn test_set_then_get_cache_coherence() {
        let store = store();
        let options = StoreOptions::new();

        store.set("counter", &1, &options);
        assert_eq!(*store.get("counter", &default_99(), &options), 1);

        store.set("counter", &2, &options);
        assert_eq!(*store.get("counter", &default_99(), &options), 2);
    }

    #[test]
    fn test_snapshot_identity_is_stable_between_notifications() {
        let store = store();
        let options = StoreOptions::new();
        store.set("counter", &1, &options);

        let a = store.get("counter", &default_99(), &options);
        let b = store.get("counter", &default_99(), &options);
        assert!(Arc::ptr_eq(&a, &b));

        store.set("counter", &2, &options);
        let c = store.get("counter", &default_99(), &options);
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = store();
        let options = StoreOptions::new();

        store.remove("counter", &options);
        assert_eq!(*store.get("counter", &default_99(), &options), 99);

        store.set("counter", &5, &options);
        store.remove("counter", &options);
        store.remove("counter", &options);
        assert_eq!(*store.get("counter", &default_99(), &options), 99);
    }

    #[test]
    fn test_same_context_notification_is_synchronous() {
        let store = store();
        let options = StoreOptions::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe("counter", default_99(), &options, move |value| {
            sink.lock().unwrap().push(*value);
        });

        store.set("counter", &1, &options);
        // Delivered synchronously, no native event involved.
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        store.remove("counter", &options);
        assert_eq!(*seen.lock().unwrap(), vec![1, 99]);
    }

    #[test]
    fn test_subscriber_rereads_fresh_value_inside_callback() {
        let store = store();
        let options = StoreOptions::new();
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = store.clone();
        let sink = Arc::clone(&observed);
        let _subscription = store.subscribe("counter", default_99(), &options, move |_| {
            // Re-reading during the callback must observe the new value,
            // never a stale cache entry.
            let fresh = reader.get("counter", &DefaultValue::literal(99), &StoreOptions::new());
            sink.lock().unwrap().push(*fresh);
        });

        store.set("counter", &1, &options);
        store.set("counter", &2, &options);
        assert_eq!(*observed.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe_is_immediate_and_exact() {
        let store = store();
        let options = StoreOptions::new();
        let removed_calls = Arc::new(AtomicUsize::new(0));
        let kept_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&removed_calls);
        let removed = store.subscribe("counter", default_99(), &options, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&kept_calls);
        let _kept = store.subscribe("counter", default_99(), &options, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set("counter", &1, &options);
        removed.unsubscribe();
        removed.unsubscribe(); // double-unsubscribe is a no-op
        assert!(!removed.is_active());

        store.set("counter", &2, &options);
        assert_eq!(removed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(kept_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = store();
        let options = StoreOptions::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let subscription = store.subscribe("counter", default_99(), &options, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        store.set("counter", &1, &options);
        drop(subscription);
        store.set("counter", &2, &options);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let store = store();
        let options = StoreOptions::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let counter = Arc::clone(&calls);
        let own_slot = Arc::clone(&slot);
        let subscription = store.subscribe("counter", default_99(), &options, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(subscription) = own_slot.lock().unwrap().take() {
                subscription.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(subscription);

        store.set("counter", &1, &options);
        store.set("counter", &2, &options);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memory_stores_share_state_within_one_registry() {
        let registry = Arc::new(Registry::new());
        let writer = Store::new(Arc::clone(&registry));
        let reader = Store::new(registry);
        let options = StoreOptions::new();

        writer.set("counter", &42, &options);
        assert_eq!(*reader.get("counter", &default_99(), &options), 42);
    }

    #[test]
    fn test_separate_registries_are_isolated() {
        let a = store();
        let b = store();
        let options = StoreOptions::new();

        a.set("counter", &1, &options);
        assert_eq!(*b.get("counter", &default_99(), &options), 99);
    }
}
