//! Error types for synckv operations

use thiserror::Error;

/// Codec errors raised while converting values to or from the wire string.
///
/// Decode failures are recovered inside the store: the reader falls back
/// to its default value and a rate-limited diagnostic is logged. They are
/// never surfaced to `get`/`subscribe` callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encode failed: {reason}")]
    Encode { reason: String },

    #[error("Decode failed: {reason}")]
    Decode { reason: String },
}

/// Storage backend errors.
///
/// Persist failures are write-and-forget: the store logs them and drops
/// the write, leaving the backend's true state authoritative.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Quota exceeded writing key {key}: {reason}")]
    QuotaExceeded { key: String, reason: String },

    #[error("Backend error: {reason}")]
    Backend { reason: String },
}

/// Configuration errors, rejected eagerly at options construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Codec pair incomplete: {missing} not supplied")]
    CodecPairIncomplete { missing: &'static str },

    #[error("Persistent backend required but none is available")]
    PersistenceUnavailable,
}

/// Master error type for all synckv errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynckvError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for synckv operations.
pub type SynckvResult<T> = Result<T, SynckvError>;

// =============================================================================
// TESTS
// =============================================================================
