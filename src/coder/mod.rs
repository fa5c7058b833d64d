//! Coder Module
//!
//! Pluggable encode/decode strategies turning typed values into bytes and
//! back. Three strategies are provided: structural JSON, a binary object
//! format, and a SIMD-accelerated JSON variant.

mod binary;
mod json;
mod simd;

pub use binary::{BincodeCoder, BincodeProtocol};
pub use json::JsonCoder;
pub use simd::SimdJsonCoder;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Injectable Hooks ==
/// Fallback transform applied to structural data before JSON serialization.
///
/// Used to rewrite values the generic transform cannot represent directly,
/// such as store-specific identifier types.
pub type EncodeHook = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Post-processing transform applied to structural data after JSON parsing,
/// before the value is reconstructed into its target type.
pub type DecodeHook = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

// == Coder ==
/// Encode/decode strategy, selected once at configuration time.
///
/// Dispatch is by enum rather than trait object because `encode` and
/// `decode` are generic over the value type, and the coordinator must hold
/// a single default coder serving heterogeneous call sites.
#[derive(Debug, Clone)]
pub enum Coder {
    /// Structural JSON with injectable hooks
    Json(JsonCoder),
    /// Binary object format, no structural intermediate
    Bincode(BincodeCoder),
    /// SIMD-accelerated JSON with the same hook contract as [`Coder::Json`]
    SimdJson(SimdJsonCoder),
}

impl Default for Coder {
    fn default() -> Self {
        Coder::Json(JsonCoder::new())
    }
}

impl Coder {
    // == Encode ==
    /// Encodes a value to bytes with the selected strategy.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Coder::Json(coder) => coder.encode(value),
            Coder::Bincode(coder) => coder.encode(value),
            Coder::SimdJson(coder) => coder.encode(value),
        }
    }

    // == Decode ==
    /// Decodes bytes back into the declared target type.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Coder::Json(coder) => coder.decode(bytes),
            Coder::Bincode(coder) => coder.decode(bytes),
            Coder::SimdJson(coder) => coder.decode(bytes),
        }
    }
}

// == Type Adapter ==
/// Converts a typed value into structural data.
pub(crate) fn dump<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|err| CacheError::Encode {
        type_name: std::any::type_name::<T>(),
        reason: err.to_string(),
    })
}

/// Reconstructs a typed value from structural data.
///
/// A structural `null` reconstructs the null-equivalent target value
/// (`None` for `Option` targets). Union targets are serde enums: the
/// matching member is selected, and a decode error is returned when no
/// member matches.
pub(crate) fn load<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|err| CacheError::Decode {
        type_name: std::any::type_name::<T>(),
        reason: err.to_string(),
    })
}
