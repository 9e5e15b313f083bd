//! Value cache with raw-value coherence and a malformed-data warning
//! ledger.
//!
//! The cache memoizes the decoded value per scoped key. An entry is valid
//! only while its recorded raw value still equals the backend's current
//! raw value for that key; any mismatch forces a re-decode. This avoids
//! redundant decode work and keeps snapshots referentially stable (the
//! same `Arc` is returned until the raw value moves), which matters for
//! consumers doing identity-based change detection.
//!
//! Decode failures fall back to the reader's default and warn at most
//! once per distinct malformed raw value per key; a different malformed
//! value, or a successful decode, resets the ledger entry.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use synckv_core::{CodecPair, Decoded, DefaultValue, ScopedKey, StorageBackend};

struct CacheEntry {
    last_raw: String,
    decoded: Arc<dyn Any + Send + Sync>,
}

/// Decoded-value cache partitioned by scoped key.
pub(crate) struct ValueCache {
    entries: RwLock<HashMap<ScopedKey, CacheEntry>>,
    /// key -> last malformed raw value warned about.
    ledger: Mutex<HashMap<String, String>>,
}

impl ValueCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ledger: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the current decoded value for a key.
    ///
    /// Reads the raw value, serves the cached `Arc` when the raw value is
    /// unchanged, re-decodes otherwise. Absent raw values, the unset
    /// token, and undecodable raw values all resolve to the caller's
    /// default; only successful decodes are cached, so a transient reader
    /// retry during an in-flight external write never sticks to a bad
    /// entry.
    pub(crate) fn resolve<T: Send + Sync + 'static>(
        &self,
        backend: &dyn StorageBackend,
        key: &str,
        codec: &CodecPair<T>,
        default: &DefaultValue<T>,
    ) -> Arc<T> {
        let raw = match backend.get_item(key) {
            Some(raw) => raw,
            None => return default.resolve(),
        };

        let scoped = ScopedKey::new(backend.backend_id(), key);
        if let Some(hit) = self.lookup::<T>(&scoped, &raw) {
            return hit;
        }

        match codec.decode(&raw) {
            Ok(Decoded::Value(value)) => {
                let decoded = Arc::new(value);
                self.store(scoped, raw, Arc::clone(&decoded) as Arc<dyn Any + Send + Sync>);
                self.clear_warning(key);
                decoded
            }
            Ok(Decoded::Unset) => default.resolve(),
            Err(err) => {
                if self.note_malformed(key, &raw) {
                    tracing::warn!(
                        key,
                        error = %err,
                        "undecodable raw value, falling back to default"
                    );
                }
                default.resolve()
            }
        }
    }

    fn lookup<T: Send + Sync + 'static>(&self, scoped: &ScopedKey, raw: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().expect("cache lock poisoned");
        let entry = entries.get(scoped)?;
        if entry.last_raw != raw {
            return None;
        }
        Arc::clone(&entry.decoded).downcast::<T>().ok()
    }

    fn store(&self, scoped: ScopedKey, raw: String, decoded: Arc<dyn Any + Send + Sync>) {
        self.entries.write().expect("cache lock poisoned").insert(
            scoped,
            CacheEntry {
                last_raw: raw,
                decoded,
            },
        );
    }

    /// Drop the entry for a scoped key. Called before subscribers are
    /// notified, so a subscriber re-reading inside its own callback never
    /// observes a stale decoded value.
    pub(crate) fn evict(&self, scoped: &ScopedKey) {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .remove(scoped);
    }

    /// Record a malformed raw value. Returns true when this exact raw
    /// value has not been warned about for this key yet.
    fn note_malformed(&self, key: &str, raw: &str) -> bool {
        let mut ledger = self.ledger.lock().expect("ledger lock poisoned");
        match ledger.get(key) {
            Some(last) if last == raw => false,
            _ => {
                ledger.insert(key.to_string(), raw.to_string());
                true
            }
        }
    }

    fn clear_warning(&self, key: &str) {
        self.ledger.lock().expect("ledger lock poisoned").remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn codec() -> CodecPair<i64> {
        CodecPair::json()
    }

    #[test]
    fn test_absent_key_resolves_to_default() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        let value = cache.resolve(&backend, "counter", &codec(), &DefaultValue::literal(99));
        assert_eq!(*value, 99);
        // The default is not cached as "the" value.
        assert!(cache.entries.read().unwrap().is_empty());
    }

    #[test]
    fn test_unchanged_raw_serves_same_arc() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        backend.set_item("counter", "7").unwrap();

        let default = DefaultValue::literal(99);
        let first = cache.resolve(&backend, "counter", &codec(), &default);
        let second = cache.resolve(&backend, "counter", &codec(), &default);
        assert_eq!(*first, 7);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_raw_change_forces_redecode() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        let default = DefaultValue::literal(99);

        backend.set_item("counter", "1").unwrap();
        let first = cache.resolve(&backend, "counter", &codec(), &default);
        assert_eq!(*first, 1);

        // Raw value moves underneath the cache entry.
        backend.set_item("counter", "2").unwrap();
        let second = cache.resolve(&backend, "counter", &codec(), &default);
        assert_eq!(*second, 2);
    }

    #[test]
    fn test_eviction_invalidates_identity() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        let default = DefaultValue::literal(99);
        backend.set_item("counter", "7").unwrap();

        let first = cache.resolve(&backend, "counter", &codec(), &default);
        cache.evict(&ScopedKey::new(backend.backend_id(), "counter"));
        let second = cache.resolve(&backend, "counter", &codec(), &default);

        assert_eq!(*first, *second);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unset_token_resolves_to_default() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        backend.set_item("counter", synckv_core::UNSET_TOKEN).unwrap();

        let value = cache.resolve(&backend, "counter", &codec(), &DefaultValue::literal(99));
        assert_eq!(*value, 99);
        assert!(cache.entries.read().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_raw_resolves_to_default_and_is_not_cached() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        backend.set_item("counter", "{not json").unwrap();

        let default = DefaultValue::literal(99);
        let value = cache.resolve(&backend, "counter", &codec(), &default);
        assert_eq!(*value, 99);
        assert!(cache.entries.read().unwrap().is_empty());

        // Backend recovers; the reader sees the real value again.
        backend.set_item("counter", "3").unwrap();
        assert_eq!(*cache.resolve(&backend, "counter", &codec(), &default), 3);
    }

    #[test]
    fn test_warning_ledger_dedups_per_raw_value() {
        let cache = ValueCache::new();

        assert!(cache.note_malformed("counter", "{bad"));
        assert!(!cache.note_malformed("counter", "{bad"));
        // A different malformed value warns again.
        assert!(cache.note_malformed("counter", "{worse"));
        // And re-seeing the first one warns again too: the ledger holds
        // only the last raw value per key.
        assert!(cache.note_malformed("counter", "{bad"));
    }

    #[test]
    fn test_successful_decode_resets_ledger() {
        let cache = ValueCache::new();
        let backend = MemoryBackend::new();
        let default = DefaultValue::literal(99);

        backend.set_item("counter", "{bad").unwrap();
        cache.resolve(&backend, "counter", &codec(), &default);
        assert!(!cache.note_malformed("counter", "{bad"));

        backend.set_item("counter", "5").unwrap();
        cache.resolve(&backend, "counter", &codec(), &default);

        // Ledger entry was cleared by the successful decode.
        assert!(cache.note_malformed("counter", "{bad"));
    }

    #[test]
    fn test_ledger_is_per_key() {
        let cache = ValueCache::new();
        assert!(cache.note_malformed("left", "{bad"));
        assert!(cache.note_malformed("right", "{bad"));
    }
}
