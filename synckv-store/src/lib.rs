//! synckv Store - The Synchronization Engine
//!
//! Makes a single logical value, identified by a key, consistent across
//! independent execution contexts that share a persistent key-value
//! backend but cannot otherwise communicate.
//!
//! # Architecture
//!
//! A write takes the direct path:
//!
//! ```text
//! set -> encode -> persist -> evict cache -> notify local subscribers
//! ```
//!
//! A write performed by *another* context arrives on the bridged path:
//!
//! ```text
//! native event -> bridge (filter by backend + key) -> evict -> notify
//! ```
//!
//! Both paths converge on the change broadcaster, so subscribers observe
//! one uniform notification stream. Subscribers never receive raw change
//! events; on every notification they re-read the decoded value through
//! the cache, which insulates them from decode failures.
//!
//! # Degraded mode
//!
//! With no persistent backend configured, stores operate against a
//! process-local in-memory map owned by the [`Registry`]. Everything else
//! behaves identically; there are simply no cross-context events.

pub mod backend;
pub mod bound;
pub mod bridge;
pub mod broadcast;
pub mod cache;
pub mod options;
pub mod reactive;
pub mod registry;
pub mod store;
pub mod subscription;

pub use backend::MemoryBackend;
pub use bound::BoundValue;
pub use options::StoreOptions;
pub use reactive::ReactiveSource;
pub use registry::Registry;
pub use store::Store;
pub use subscription::Subscription;

// Re-export core types for convenience
pub use synckv_core::{
    BackendId, BackendKind, ChangeEvent, ChangeListener, CodecPair, ConfigError, Decoded,
    DefaultValue, ScopedKey, StorageBackend, SynckvError, SynckvResult, WatchGuard, UNSET_TOKEN,
};
