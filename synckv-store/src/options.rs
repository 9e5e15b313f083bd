//! Per-operation options: backend choice and codec.
//!
//! The backend is selected once, when the options are built, not branched
//! per call: `None` means the registry's in-memory fallback. The codec is
//! always a matched pair; the options-bag constructor rejects a
//! half-supplied pair eagerly, so misconfiguration never surfaces at
//! first use.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use synckv_core::{
    BackendKind, CodecPair, ConfigError, DecodeFn, EncodeFn, StorageBackend,
};

use crate::registry::Registry;

/// Options shared by the store operations for one value type.
pub struct StoreOptions<T> {
    backend: Option<Arc<dyn StorageBackend>>,
    codec: CodecPair<T>,
}

impl<T: Serialize + DeserializeOwned> StoreOptions<T> {
    /// In-memory fallback backend, default JSON codec.
    pub fn new() -> Self {
        Self {
            backend: None,
            codec: CodecPair::json(),
        }
    }

    /// Build options from an options-bag shape: an optional backend and
    /// optional encode/decode halves. Supplying exactly one codec half is
    /// rejected here, at the boundary.
    pub fn from_parts(
        backend: Option<Arc<dyn StorageBackend>>,
        encode: Option<EncodeFn<T>>,
        decode: Option<DecodeFn<T>>,
    ) -> Result<Self, ConfigError> {
        let codec = CodecPair::from_parts(encode, decode)?.unwrap_or_else(CodecPair::json);
        Ok(Self { backend, codec })
    }

    /// Options that demand persistence. Errors when no persistent backend
    /// is available; use [`StoreOptions::new`] plus
    /// [`with_backend`](StoreOptions::with_backend) for operations that
    /// may gracefully degrade to the in-memory fallback instead.
    pub fn require_persistent(
        backend: Option<Arc<dyn StorageBackend>>,
    ) -> Result<Self, ConfigError> {
        match backend {
            Some(backend) if backend.kind() == BackendKind::Persistent => Ok(Self {
                backend: Some(backend),
                codec: CodecPair::json(),
            }),
            _ => Err(ConfigError::PersistenceUnavailable),
        }
    }
}

impl<T: Serialize + DeserializeOwned> Default for StoreOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StoreOptions<T> {
    /// Use the given backend instead of the in-memory fallback.
    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the codec with a custom pair.
    pub fn with_codec(mut self, codec: CodecPair<T>) -> Self {
        self.codec = codec;
        self
    }

    /// The configured backend, or `None` for the in-memory fallback.
    pub fn backend(&self) -> Option<&Arc<dyn StorageBackend>> {
        self.backend.as_ref()
    }

    /// The configured codec pair.
    pub fn codec(&self) -> &CodecPair<T> {
        &self.codec
    }

    pub(crate) fn resolve_backend(&self, registry: &Registry) -> Arc<dyn StorageBackend> {
        match &self.backend {
            Some(backend) => Arc::clone(backend),
            None => registry.memory_backend(),
        }
    }
}

impl<T> Clone for StoreOptions<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<T> std::fmt::Debug for StoreOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOptions")
            .field(
                "backend",
                &self.backend.as_ref().map(|backend| backend.backend_id()),
            )
            .finish_non_exhaustive()
    }
}
