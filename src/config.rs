//! Configuration Module
//!
//! Holds the coordinator configuration assembled at composition time.

use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::coder::Coder;
use crate::key::{DefaultKeyBuilder, KeyBuilder};

/// Default width of the blocking worker pool
pub const DEFAULT_BLOCKING_WORKERS: usize = 8;

// == Cache Config ==
/// Configuration installed into the coordinator by
/// [`MemoCache::init`](crate::MemoCache::init).
///
/// Each `init` replaces the previous configuration wholesale; there is no
/// field-level merging.
#[derive(Clone)]
pub struct CacheConfig {
    /// Storage backend shared by all wrapped call sites
    pub backend: Arc<dyn Backend>,
    /// Global key prefix, prepended to every namespace
    pub prefix: String,
    /// Default TTL in seconds, None = entries never expire
    pub expire: Option<u64>,
    /// Default coder for call sites without an override
    pub coder: Coder,
    /// Default key builder for call sites without an override
    pub key_builder: Arc<dyn KeyBuilder>,
    /// Initial state of the global enable flag
    pub enable: bool,
    /// Maximum concurrent blocking computations
    pub blocking_workers: usize,
}

impl CacheConfig {
    // == Builder ==
    /// Starts a builder over the given backend.
    ///
    /// # Defaults
    /// - `prefix` - empty string
    /// - `expire` - None (no expiry)
    /// - `coder` - structural JSON
    /// - `key_builder` - SHA-256 default builder
    /// - `enable` - true
    /// - `blocking_workers` - 8
    pub fn builder<B>(backend: B) -> CacheConfigBuilder
    where
        B: Backend + 'static,
    {
        CacheConfigBuilder {
            config: CacheConfig {
                backend: Arc::new(backend),
                prefix: String::new(),
                expire: None,
                coder: Coder::default(),
                key_builder: Arc::new(DefaultKeyBuilder),
                enable: true,
                blocking_workers: DEFAULT_BLOCKING_WORKERS,
            },
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("prefix", &self.prefix)
            .field("expire", &self.expire)
            .field("coder", &self.coder)
            .field("enable", &self.enable)
            .field("blocking_workers", &self.blocking_workers)
            .finish()
    }
}

// == Config Builder ==
/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Sets the global key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Sets the default TTL in seconds.
    pub fn expire(mut self, expire: u64) -> Self {
        self.config.expire = Some(expire);
        self
    }

    /// Sets the default coder.
    pub fn coder(mut self, coder: Coder) -> Self {
        self.config.coder = coder;
        self
    }

    /// Sets the default key builder.
    pub fn key_builder<K>(mut self, key_builder: K) -> Self
    where
        K: KeyBuilder + 'static,
    {
        self.config.key_builder = Arc::new(key_builder);
        self
    }

    /// Sets the initial enable flag.
    pub fn enable(mut self, enable: bool) -> Self {
        self.config.enable = enable;
        self
    }

    /// Sets the blocking worker pool width.
    pub fn blocking_workers(mut self, workers: usize) -> Self {
        self.config.blocking_workers = workers;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
