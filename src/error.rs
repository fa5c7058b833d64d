//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Coordinator used before `init` was called
    #[error("Cache not configured: {0}")]
    Config(String),

    /// Value could not be encoded by the active coder
    #[error("Failed to encode value of type {type_name}: {reason}")]
    Encode {
        /// Rust type of the value that failed to encode
        type_name: &'static str,
        /// Underlying serializer message
        reason: String,
    },

    /// Stored bytes do not match the declared target type
    #[error("Failed to decode cached bytes as {type_name}: {reason}")]
    Decode {
        /// Target type the bytes were decoded as
        type_name: &'static str,
        /// Underlying deserializer message
        reason: String,
    },

    /// Backend store unavailable or rejected the operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// Error raised by the wrapped computation, propagated unchanged
    #[error(transparent)]
    Compute(#[from] anyhow::Error),

    /// Worker pool or other internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
