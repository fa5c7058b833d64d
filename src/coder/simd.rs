//! High-Performance JSON Coder
//!
//! Same contract as the structural JSON coder, with serialization and
//! parsing delegated to simd-json.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{dump, load, DecodeHook, EncodeHook};
use crate::error::{CacheError, Result};

// == SIMD JSON Coder ==
/// SIMD-accelerated JSON coder.
///
/// Shares the structural pipeline and hook contract of
/// [`JsonCoder`](super::JsonCoder); only the byte-level JSON implementation
/// differs. The decode path funnels through the same type reconstruction.
#[derive(Clone, Default)]
pub struct SimdJsonCoder {
    encode_hook: Option<EncodeHook>,
    decode_hook: Option<DecodeHook>,
    pretty: bool,
}

impl SimdJsonCoder {
    // == Constructor ==
    /// Creates a coder with no hooks and compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables pretty-printed output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Installs a fallback transform applied before serialization.
    pub fn with_encode_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.encode_hook = Some(std::sync::Arc::new(hook));
        self
    }

    /// Installs a post-processing transform applied after parsing.
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

        let result = if self.pretty {
            simd_json::serde::to_vec_pretty(&data)
        } else {
            simd_json::serde::to_vec(&data)
        };
        result.map_err(|err| CacheError::Encode {
            type_name: std::any::type_name::<T>(),
            reason: err.to_string(),
        })
    }

    // == Decode ==
    pub(crate) fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        // simd-json parses in place, so it needs its own mutable copy
        let mut buf = bytes.to_vec();
        let mut data: Value =
            simd_json::serde::from_slice(&mut buf).map_err(|err| CacheError::Decode {
                type_name: std::any::type_name::<T>(),
                reason: err.to_string(),
            })?;
        if let Some(hook) = &self.decode_hook {
            data = hook(data)?;
        }
        load(data)
    }
}

impl fmt::Debug for SimdJsonCoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimdJsonCoder")
            .field("encode_hook", &self.encode_hook.is_some())
            .field("decode_hook", &self.decode_hook.is_some())
            .field("pretty", &self.pretty)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let coder = SimdJsonCoder::new();
        let value = json!({"id": 9, "tags": ["a", "b"]});
        let bytes = coder.encode(&value).unwrap();
        let back: Value = coder.decode(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_output_is_readable_by_plain_json() {
        let coder = SimdJsonCoder::new();
        let bytes = coder.encode(&json!({"n": 1})).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, json!({"n": 1}));
    }

    #[test]
    fn test_pretty_flag_changes_output_shape() {
        let value = json!({"a": 1, "b": 2});
        let compact = SimdJsonCoder::new().encode(&value).unwrap();
        let pretty = SimdJsonCoder::new().pretty(true).encode(&value).unwrap();

        assert!(pretty.len() > compact.len());
        let back: Value = SimdJsonCoder::new().decode(&pretty).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_hooks_apply_in_both_directions() {
        let coder = SimdJsonCoder::new()
            .with_encode_hook(|data| Ok(json!({ "wrapped": data })))
            .with_decode_hook(|data| match data {
                Value::Object(mut map) => Ok(map.remove("wrapped").unwrap_or(Value::Null)),
                other => Ok(other),
            });

        let bytes = coder.encode(&json!([1, 2])).unwrap();
        let back: Value = coder.decode(&bytes).unwrap();
        assert_eq!(back, json!([1, 2]));
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let coder = SimdJsonCoder::new();
        let result: Result<Value> = coder.decode(b"{broken");
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }
}
