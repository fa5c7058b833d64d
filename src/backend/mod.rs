//! Backend Module
//!
//! Key-value storage with TTL semantics and prefix-scoped clearing.

mod entry;
mod memory;
mod redis;
mod stats;

// Re-export public types
pub use self::redis::RedisBackend;
pub use entry::StoredEntry;
pub use memory::InMemoryBackend;
pub use stats::BackendStats;

use async_trait::async_trait;

use crate::error::Result;

// == Backend Trait ==
/// Storage contract for cached entries.
///
/// Implementations must be safe to share across concurrent tasks; mutating
/// operations must not corrupt shared state.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Retrieves the bytes stored under a key.
    ///
    /// An expired entry reads as absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores bytes under a key with an optional TTL in seconds.
    async fn set(&self, key: &str, value: Vec<u8>, expire: Option<u64>) -> Result<()>;

    /// Removes entries and returns the number removed.
    ///
    /// - `clear(Some(namespace), None)` removes every key beginning with
    ///   `"{namespace}:"`.
    /// - `clear(None, Some(key))` removes exactly that key.
    /// - Semantics of `clear(None, None)` are implementation-defined; see
    ///   each backend.
    ///
    /// When both are given, the explicit key wins.
    async fn clear(&self, namespace: Option<&str>, key: Option<&str>) -> Result<u64>;
}
