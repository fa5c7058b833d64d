//! Structural JSON Coder
//!
//! Encodes through an intermediate structural value so that injectable
//! hooks can rewrite data on the way in and out.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{dump, load, DecodeHook, EncodeHook};
use crate::error::{CacheError, Result};

// == JSON Coder ==
/// Structural JSON coder.
///
/// Encoding converts the value into structural data, applies the optional
/// encode hook (the "default" fallback for values the generic transform
/// cannot represent), and serializes to JSON bytes. Decoding parses the
/// bytes, applies the optional decode hook, and reconstructs the declared
/// target type.
#[derive(Clone, Default)]
pub struct JsonCoder {
    encode_hook: Option<EncodeHook>,
    decode_hook: Option<DecodeHook>,
}

impl JsonCoder {
    // == Constructor ==
    /// Creates a JSON coder with no hooks installed.
    pub fn new() -> Self {
        Self::default()
    }

    // == Encode Hook ==
    /// Installs a fallback transform applied to structural data before
    /// serialization.
    pub fn with_encode_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.encode_hook = Some(std::sync::Arc::new(hook));
        self
    }

    // == Decode Hook ==
    /// Installs a post-processing transform applied to structural data
    /// after parsing, before type reconstruction.
    pub fn with_decode_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.decode_hook = Some(std::sync::Arc::new(hook));
        self
    }

    // == Encode ==
    pub(crate) fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let mut data = dump(value)?;
        if let Some(hook) = &self.encode_hook {
            data = hook(data)?;
        }
        serde_json::to_vec(&data).map_err(|err| CacheError::Encode {
            type_name: std::any::type_name::<T>(),
            reason: err.to_string(),
        })
    }

    // == Decode ==
    pub(crate) fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let mut data: Value = serde_json::from_slice(bytes).map_err(|err| CacheError::Decode {
            type_name: std::any::type_name::<T>(),
            reason: err.to_string(),
        })?;
        if let Some(hook) = &self.decode_hook {
            data = hook(data)?;
        }
        load(data)
    }
}

impl fmt::Debug for JsonCoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCoder")
            .field("encode_hook", &self.encode_hook.is_some())
            .field("decode_hook", &self.decode_hook.is_some())
            .finish()
    }
}
