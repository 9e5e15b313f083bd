//! synckv Core - Data Types and Contracts
//!
//! Pure data structures and contracts with no synchronization logic.
//! The engine lives in `synckv-store`; this crate defines what it speaks:
//! backend identity, scoped keys, change events, the codec contract, and
//! the error taxonomy. All other crates depend on this.

pub mod codec;
pub mod default_value;
pub mod error;
pub mod event;
pub mod identity;

pub use codec::{CodecPair, Decoded, DecodeFn, EncodeFn, UNSET_TOKEN};
pub use default_value::DefaultValue;
pub use error::{CodecError, ConfigError, StorageError, SynckvError, SynckvResult};
pub use event::{ChangeEvent, ChangeListener, StorageBackend, WatchGuard};
pub use identity::{BackendId, BackendKind, ScopedKey};
