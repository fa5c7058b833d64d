//! Binary Object Coder
//!
//! Serde round trip through bincode. The binary form preserves structure
//! natively, so no structural intermediate or reconstruction step is
//! involved.

use bincode::Options as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Bincode Protocol ==
/// Integer encoding protocol for the binary coder.
///
/// Bytes written under one protocol are not readable under the other; there
/// is no portability guarantee across differing protocol choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BincodeProtocol {
    /// Fixed-width integer encoding
    #[default]
    Fixint,
    /// Variable-width integer encoding, more compact for small values
    Varint,
}

// == Bincode Coder ==
/// Binary object coder with a configurable encoding protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCoder {
    protocol: BincodeProtocol,
}

impl BincodeCoder {
    // == Constructor ==
    /// Creates a binary coder with the default fixed-width protocol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a binary coder with an explicit protocol.
    pub fn with_protocol(protocol: BincodeProtocol) -> Self {
        Self { protocol }
    }

    // == Encode ==
    pub(crate) fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let result = match self.protocol {
            BincodeProtocol::Fixint => bincode::options()
                .with_fixint_encoding()
                .serialize(value),
            BincodeProtocol::Varint => bincode::options()
                .with_varint_encoding()
                .serialize(value),
        };
        result.map_err(|err| CacheError::Encode {
            type_name: std::any::type_name::<T>(),
            reason: err.to_string(),
        })
    }

    // == Decode ==
    pub(crate) fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let result = match self.protocol {
            BincodeProtocol::Fixint => bincode::options()
                .with_fixint_encoding()
                .deserialize(bytes),
            BincodeProtocol::Varint => bincode::options()
                .with_varint_encoding()
                .deserialize(bytes),
        };
        result.map_err(|err| CacheError::Decode {
            type_name: std::any::type_name::<T>(),
            reason: err.to_string(),
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i64,
        y: i64,
        label: Option<String>,
    }

    #[test]
    fn test_round_trip_both_protocols() {
        let value = Point {
            x: -4,
            y: 900,
            label: Some("origin".to_string()),
        };

        for protocol in [BincodeProtocol::Fixint, BincodeProtocol::Varint] {
            let coder = BincodeCoder::with_protocol(protocol);
            let bytes = coder.encode(&value).unwrap();
            let back: Point = coder.decode(&bytes).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_varint_is_more_compact_for_small_values() {
        let value = Point {
            x: 1,
            y: 2,
            label: None,
        };

        let fixint = BincodeCoder::with_protocol(BincodeProtocol::Fixint)
            .encode(&value)
            .unwrap();
        let varint = BincodeCoder::with_protocol(BincodeProtocol::Varint)
            .encode(&value)
            .unwrap();
        assert!(varint.len() < fixint.len());
    }

    #[test]
    fn test_protocol_mismatch_does_not_round_trip() {
        let value = Point {
            x: 300,
            y: 300,
            label: Some("far".to_string()),
        };

        let bytes = BincodeCoder::with_protocol(BincodeProtocol::Varint)
            .encode(&value)
            .unwrap();
        let crossed: Result<Point> =
            BincodeCoder::with_protocol(BincodeProtocol::Fixint).decode(&bytes);

        // Either an outright decode error or a value that is not the original
        match crossed {
            Err(CacheError::Decode { .. }) => {}
            Ok(decoded) => assert_ne!(decoded, value),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_bytes_is_decode_error() {
        let coder = BincodeCoder::new();
        let bytes = coder.encode(&42u64).unwrap();
        let result: Result<u64> = coder.decode(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }
}
