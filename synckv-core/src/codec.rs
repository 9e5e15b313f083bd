//! Codec contract: value to/from wire string, always supplied as a pair.
//!
//! The default codec is JSON via serde, with one extra rule: the
//! distinguished raw string [`UNSET_TOKEN`] decodes to "no value", so the
//! idea of an unset value is representable in the wire format as its own
//! token, not only through absence of the key.
//!
//! Supplying only half of a custom encode/decode pair is a configuration
//! error caught at construction ([`CodecPair::from_parts`]), never at
//! first use.

use crate::error::{CodecError, ConfigError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Raw string representing "no value" in the wire format.
pub const UNSET_TOKEN: &str = "undefined";

/// Outcome of decoding a raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// A decoded application value.
    Value(T),
    /// The raw string was the unset token; the reader falls back to its
    /// default value.
    Unset,
}

/// Encode half of a codec pair.
pub type EncodeFn<T> = Arc<dyn Fn(&T) -> Result<String, CodecError> + Send + Sync>;

/// Decode half of a codec pair.
pub type DecodeFn<T> = Arc<dyn Fn(&str) -> Result<Decoded<T>, CodecError> + Send + Sync>;

/// A paired encode/decode for one value type.
///
/// Construction always takes both halves, so a store cannot be configured
/// with a parse and no stringify (or vice versa).
pub struct CodecPair<T> {
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T> Clone for CodecPair<T> {
    fn clone(&self) -> Self {
        Self {
            encode: Arc::clone(&self.encode),
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<T> std::fmt::Debug for CodecPair<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecPair").finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> CodecPair<T> {
    /// The default JSON codec.
    pub fn json() -> Self {
        Self {
            encode: Arc::new(|value: &T| {
                serde_json::to_string(value).map_err(|err| CodecError::Encode {
                    reason: err.to_string(),
                })
            }),
            decode: Arc::new(|raw: &str| {
                if raw == UNSET_TOKEN {
                    return Ok(Decoded::Unset);
                }
                serde_json::from_str(raw)
                    .map(Decoded::Value)
                    .map_err(|err| CodecError::Decode {
                        reason: err.to_string(),
                    })
            }),
        }
    }
}

impl<T> CodecPair<T> {
    /// A custom codec from a matched encode/decode pair.
    pub fn custom(
        encode: impl Fn(&T) -> Result<String, CodecError> + Send + Sync + 'static,
        decode: impl Fn(&str) -> Result<Decoded<T>, CodecError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Validate an options-bag shaped codec: both halves, or neither.
    ///
    /// Returns `Ok(None)` when neither half is supplied (the caller uses
    /// the default codec) and `Err(ConfigError::CodecPairIncomplete)`
    /// when exactly one is.
    pub fn from_parts(
        encode: Option<EncodeFn<T>>,
        decode: Option<DecodeFn<T>>,
    ) -> Result<Option<Self>, ConfigError> {
        match (encode, decode) {
            (Some(encode), Some(decode)) => Ok(Some(Self { encode, decode })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::CodecPairIncomplete { missing: "decode" }),
            (None, Some(_)) => Err(ConfigError::CodecPairIncomplete { missing: "encode" }),
        }
    }

    /// Encode a value to its wire string.
    pub fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value)
    }

    /// Decode a wire string.
    pub fn decode(&self, raw: &str) -> Result<Decoded<T>, CodecError> {
        (self.decode)(raw)
    }
}
