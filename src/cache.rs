//! Cache Coordinator Module
//!
//! Process-wide coordination: configuration lifecycle, accessors used by
//! the wrappers, scoped clearing and the global enable toggle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::backend::Backend;
use crate::cached::Cached;
use crate::coder::Coder;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::key::KeyBuilder;
use crate::tasks::BlockingPool;

// == Installed State ==
/// Configuration plus the worker pool built from it.
struct Installed {
    config: CacheConfig,
    pool: BlockingPool,
}

// == Memo Cache ==
/// Cache coordinator.
///
/// Created once at composition time and shared by `Arc`; wrappers hold a
/// reference and read configuration through the accessors. No operation is
/// valid before [`init`](Self::init); calling `init` again replaces the
/// configuration wholesale, which keeps tests independent without a
/// process restart.
pub struct MemoCache {
    /// Current configuration, None until the first `init`
    state: RwLock<Option<Installed>>,
    /// Global bypass toggle, flippable at any time
    enabled: AtomicBool,
}

impl MemoCache {
    // == Constructor ==
    /// Creates an unconfigured coordinator.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
            enabled: AtomicBool::new(true),
        }
    }

    // == Init ==
    /// Installs a configuration, replacing any previous one entirely.
    pub fn init(&self, config: CacheConfig) {
        self.enabled.store(config.enable, Ordering::SeqCst);
        let pool = BlockingPool::new(config.blocking_workers);

        info!(
            prefix = %config.prefix,
            expire = ?config.expire,
            enable = config.enable,
            "cache configured"
        );

        let mut state = self.state.write().expect("configuration lock poisoned");
        *state = Some(Installed { config, pool });
    }

    /// Runs an accessor against the installed configuration.
    fn installed<T>(&self, accessor: impl FnOnce(&Installed) -> T) -> Result<T> {
        let state = self.state.read().expect("configuration lock poisoned");
        match state.as_ref() {
            Some(installed) => Ok(accessor(installed)),
            None => Err(CacheError::Config(
                "init must be called before using the cache".to_string(),
            )),
        }
    }

    // == Accessors ==
    /// Returns the configured backend.
    pub fn backend(&self) -> Result<Arc<dyn Backend>> {
        self.installed(|state| Arc::clone(&state.config.backend))
    }

    /// Returns the configured default coder.
    pub fn coder(&self) -> Result<Coder> {
        self.installed(|state| state.config.coder.clone())
    }

    /// Returns the configured default key builder.
    pub fn key_builder(&self) -> Result<Arc<dyn KeyBuilder>> {
        self.installed(|state| Arc::clone(&state.config.key_builder))
    }

    /// Returns the configured global prefix.
    pub fn prefix(&self) -> Result<String> {
        self.installed(|state| state.config.prefix.clone())
    }

    /// Returns the configured default TTL in seconds.
    pub fn expire(&self) -> Result<Option<u64>> {
        self.installed(|state| state.config.expire)
    }

    /// Returns the blocking worker pool.
    pub(crate) fn blocking_pool(&self) -> Result<BlockingPool> {
        self.installed(|state| state.pool.clone())
    }

    // == Enable Toggle ==
    /// Returns the global enable flag.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggles the global bypass.
    ///
    /// Takes effect for subsequent calls; calls already in flight finish
    /// under the flag they started with.
    pub fn set_enable(&self, enable: bool) {
        self.enabled.store(enable, Ordering::SeqCst);
        info!(enable, "cache enable flag changed");
    }

    // == Clear ==
    /// Removes cached entries and returns the number removed.
    ///
    /// A given namespace is qualified with the configured prefix before
    /// delegating, so callers never deal with the internal key layout.
    /// With neither namespace nor key, everything under the prefix is
    /// removed.
    pub async fn clear(&self, namespace: Option<&str>, key: Option<&str>) -> Result<u64> {
        let backend = self.backend()?;

        let removed = if let Some(key) = key {
            backend.clear(None, Some(key)).await?
        } else {
            let prefix = self.prefix()?;
            let scoped = match namespace {
                Some(namespace) => format!("{prefix}:{namespace}"),
                None => prefix,
            };
            backend.clear(Some(&scoped), None).await?
        };

        info!(removed, "cache cleared");
        Ok(removed)
    }

    // == Wrapper Factory ==
    /// Creates a cached wrapper for one target computation.
    ///
    /// `function` is the qualified function name, part of every cache key
    /// the wrapper builds.
    pub fn cached(self: &Arc<Self>, function: impl Into<String>) -> Cached {
        Cached::new(Arc::clone(self), function.into())
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new()
    }
}
