//! Memocache - transparent result memoization
//!
//! Wraps computations in a hit/miss cache protocol keyed by function
//! identity and arguments, with pluggable coders and TTL backends.

pub mod backend;
pub mod cache;
pub mod cached;
pub mod coder;
pub mod config;
pub mod error;
pub mod key;
pub mod tasks;


pub use backend::{Backend, BackendStats, InMemoryBackend, RedisBackend, StoredEntry};
pub use cache::MemoCache;
pub use cached::Cached;
pub use coder::{BincodeCoder, BincodeProtocol, Coder, JsonCoder, SimdJsonCoder};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::{CacheError, Result};
pub use key::{DefaultKeyBuilder, KeyArgs, KeyBuilder};
pub use tasks::{spawn_cleanup_task, BlockingPool};
