//! synckv Test Utilities
//!
//! Centralized test infrastructure for the synckv workspace:
//! - `MockBackend`: a persistent backend with quota-failure injection and
//!   hand-fired native events
//! - `SharedArea`: one backing map shared by several mock backends, each
//!   standing in for an independent execution context; a write through
//!   one context delivers native change events to every *other* context,
//!   never to the writer
//! - Proptest generators for JSON value shapes

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use proptest::prelude::*;
use synckv_core::{
    BackendId, BackendKind, ChangeEvent, ChangeListener, StorageBackend, StorageError, WatchGuard,
};

// ============================================================================
// SHARED AREA
// ============================================================================

/// A backing map shared by N simulated contexts.
///
/// Mirrors the semantics of a browser storage area: every attached
/// [`MockBackend`] reads and writes the same entries, and a mutation made
/// through one backend fires native change events on all the others.
#[derive(Default)]
pub struct SharedArea {
    entries: RwLock<HashMap<String, String>>,
    contexts: RwLock<Vec<Weak<MockBackendInner>>>,
}

impl SharedArea {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Place a raw value directly, bypassing events. Useful for seeding
    /// malformed data.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .expect("shared area lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    /// Read a raw value directly.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("shared area lock poisoned")
            .get(key)
            .cloned()
    }

    fn attach(&self, context: Weak<MockBackendInner>) {
        self.contexts
            .write()
            .expect("shared area lock poisoned")
            .push(context);
    }

    /// Deliver a change to every context except the writer. Each receiver
    /// sees the event as originating from its own backend handle, the way
    /// a browser storage event carries the receiver's storage area.
    fn notify_others(&self, writer: BackendId, key: &str, new_value: Option<&str>) {
        let contexts: Vec<Arc<MockBackendInner>> = self
            .contexts
            .read()
            .expect("shared area lock poisoned")
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        for context in contexts {
            if context.id == writer {
                continue;
            }
            let event = ChangeEvent {
                key: key.to_string(),
                new_value: new_value.map(str::to_string),
                source: context.id,
            };
            context.deliver(&event);
        }
    }
}

// ============================================================================
// MOCK BACKEND
// ============================================================================

struct MockBackendInner {
    id: BackendId,
    area: Arc<SharedArea>,
    listeners: RwLock<Vec<(u64, ChangeListener)>>,
    next_listener: AtomicU64,
    fail_writes: AtomicBool,
    rejected_writes: AtomicU64,
}

impl MockBackendInner {
    fn deliver(&self, event: &ChangeEvent) {
        let snapshot: Vec<ChangeListener> = self
            .listeners
            .read()
            .expect("listener lock poisoned")
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

/// A persistent backend over a [`SharedArea`], standing in for one
/// execution context's handle to the shared store.
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<MockBackendInner>,
}

impl MockBackend {
    /// A backend with a private area: a single-context store.
    pub fn new() -> Self {
        Self::attached(SharedArea::new())
    }

    /// A backend attached to an existing area, simulating one more
    /// context sharing it.
    pub fn attached(area: Arc<SharedArea>) -> Self {
        let inner = Arc::new(MockBackendInner {
            id: BackendId::new(),
            area: Arc::clone(&area),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
            rejected_writes: AtomicU64::new(0),
        });
        area.attach(Arc::downgrade(&inner));
        Self { inner }
    }

    /// The area this backend reads and writes.
    pub fn area(&self) -> &Arc<SharedArea> {
        &self.inner.area
    }

    /// Make subsequent `set_item` calls fail as if the quota were
    /// exceeded.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of writes rejected by quota-failure injection.
    pub fn rejected_writes(&self) -> u64 {
        self.inner.rejected_writes.load(Ordering::SeqCst)
    }

    /// Number of native listeners currently registered on this handle.
    pub fn active_watchers(&self) -> usize {
        self.inner
            .listeners
            .read()
            .expect("listener lock poisoned")
            .len()
    }

    /// Hand-fire a native event on this handle, as if another context had
    /// mutated the backend.
    pub fn emit_external(&self, key: &str, new_value: Option<&str>) {
        if let Some(value) = new_value {
            self.inner.area.put_raw(key, value);
        } else {
            self.inner
                .area
                .entries
                .write()
                .expect("shared area lock poisoned")
                .remove(key);
        }
        let event = ChangeEvent {
            key: key.to_string(),
            new_value: new_value.map(str::to_string),
            source: self.inner.id,
        };
        self.inner.deliver(&event);
    }

    /// Deliver an arbitrary event to this handle's listeners, e.g. one
    /// carrying a foreign source identity.
    pub fn emit(&self, event: ChangeEvent) {
        self.inner.deliver(&event);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MockBackend {
    fn backend_id(&self) -> BackendId {
        self.inner.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Persistent
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.area.raw(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            self.inner.rejected_writes.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                reason: "injected quota failure".to_string(),
            });
        }
        self.inner.area.put_raw(key, value);
        self.inner.area.notify_others(self.inner.id, key, Some(value));
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.inner
            .area
            .entries
            .write()
            .expect("shared area lock poisoned")
            .remove(key);
        self.inner.area.notify_others(self.inner.id, key, None);
    }

    fn watch(&self, listener: ChangeListener) -> WatchGuard {
        let id = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .write()
            .expect("listener lock poisoned")
            .push((id, listener));

        let inner = Arc::downgrade(&self.inner);
        WatchGuard::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner
                    .listeners
                    .write()
                    .expect("listener lock poisoned")
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Strategy over arbitrary JSON value shapes, for round-trip and storage
/// properties.
pub fn json_value() -> impl Strategy<Value = serde_json::Value> {
    use serde_json::Value;

    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}
