//! Cached Wrapper Module
//!
//! Wraps a target computation in the hit/miss interception protocol:
//! check the enable flags, look the key up, decode on hit, compute and
//! write back on miss. Blocking computations are bridged onto the worker
//! pool so the async scheduler never stalls.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::cache::MemoCache;
use crate::coder::Coder;
use crate::error::{CacheError, Result};
use crate::key::{KeyArgs, KeyBuilder};

// == Resolved Site ==
/// Per-invocation resolution of configuration and overrides.
struct ResolvedSite {
    backend: Arc<dyn Backend>,
    coder: Coder,
    key: String,
    expire: Option<u64>,
}

// == Cached Wrapper ==
/// A wrapped computation identified by its qualified function name.
///
/// Built by [`MemoCache::cached`]; per-site overrides take precedence over
/// the coordinator's defaults. The wrapper is reusable across invocations
/// and cheap to clone.
///
/// # Example
/// ```ignore
/// let get_user = cache.cached("users::get_user").namespace("users").expire(60);
/// let user: User = get_user
///     .get_or_compute(KeyArgs::new().arg(&user_id)?, || async { fetch(user_id).await })
///     .await?;
/// ```
#[derive(Clone)]
pub struct Cached {
    cache: Arc<MemoCache>,
    /// Qualified function name, part of every key this wrapper builds
    function: String,
    /// Namespace segment, empty unless overridden
    namespace: String,
    /// Per-site TTL override
    expire: Option<u64>,
    /// Per-site coder override
    coder: Option<Coder>,
    /// Per-site key builder override
    key_builder: Option<Arc<dyn KeyBuilder>>,
    /// Per-site opt-out; false skips both the read and the write path
    enabled: bool,
}

impl Cached {
    // == Constructor ==
    pub(crate) fn new(cache: Arc<MemoCache>, function: String) -> Self {
        Self {
            cache,
            function,
            namespace: String::new(),
            expire: None,
            coder: None,
            key_builder: None,
            enabled: true,
        }
    }

    // == Per-Site Overrides ==
    /// Sets the namespace for this call site.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Overrides the TTL for this call site.
    pub fn expire(mut self, expire: u64) -> Self {
        self.expire = Some(expire);
        self
    }

    /// Overrides the coder for this call site.
    pub fn coder(mut self, coder: Coder) -> Self {
        self.coder = Some(coder);
        self
    }

    /// Overrides the key builder for this call site.
    pub fn key_builder<K>(mut self, key_builder: K) -> Self
    where
        K: KeyBuilder + 'static,
    {
        self.key_builder = Some(Arc::new(key_builder));
        self
    }

    /// Opts this call site out of caching entirely when set to false.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    // == Get Or Compute (async) ==
    /// Runs the interception protocol around an async computation.
    ///
    /// On a hit the decoded value is returned and the computation never
    /// runs. On a miss the computation is awaited in place and its result
    /// written back. Computation errors propagate unchanged and nothing is
    /// stored for them.
    pub async fn get_or_compute<T, F, Fut>(&self, args: KeyArgs, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if self.bypass() {
            return compute().await.map_err(CacheError::Compute);
        }

        let site = self.resolve(&args)?;
        if let Some(value) = self.try_get(&site).await? {
            return Ok(value);
        }

        let value = compute().await.map_err(CacheError::Compute)?;
        self.store(&site, &value).await?;
        Ok(value)
    }

    // == Get Or Compute (blocking) ==
    /// Runs the interception protocol around a blocking computation.
    ///
    /// The computation is dispatched to the bounded worker pool and the
    /// caller suspends until it completes; result or error comes back
    /// exactly as if the computation had been awaited directly. If the
    /// caller is cancelled while suspended, the worker's result is
    /// discarded and never stored.
    pub async fn get_or_compute_blocking<T, F>(&self, args: KeyArgs, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let pool = self.cache.blocking_pool()?;

        if self.bypass() {
            return pool.run(compute).await?.map_err(CacheError::Compute);
        }

        let site = self.resolve(&args)?;
        if let Some(value) = self.try_get(&site).await? {
            return Ok(value);
        }

        let value = pool.run(compute).await?.map_err(CacheError::Compute)?;
        self.store(&site, &value).await?;
        Ok(value)
    }

    // == Protocol Steps ==
    /// True when caching is bypassed globally or for this site.
    fn bypass(&self) -> bool {
        !self.enabled || !self.cache.is_enabled()
    }

    /// Resolves overrides against the coordinator's configuration and
    /// builds the cache key.
    fn resolve(&self, args: &KeyArgs) -> Result<ResolvedSite> {
        let backend = self.cache.backend()?;
        let coder = match &self.coder {
            Some(coder) => coder.clone(),
            None => self.cache.coder()?,
        };
        let key_builder = match &self.key_builder {
            Some(key_builder) => Arc::clone(key_builder),
            None => self.cache.key_builder()?,
        };
        let expire = match self.expire {
            Some(expire) => Some(expire),
            None => self.cache.expire()?,
        };

        let prefix = self.cache.prefix()?;
        let namespace = format!("{prefix}:{}", self.namespace);
        let key = key_builder.build(&namespace, &self.function, args);

        Ok(ResolvedSite {
            backend,
            coder,
            key,
            expire,
        })
    }

    /// Lookup step. Read-path backend errors propagate; a decode failure
    /// is surfaced as an error, never silently treated as a miss.
    async fn try_get<T: DeserializeOwned>(&self, site: &ResolvedSite) -> Result<Option<T>> {
        match site.backend.get(&site.key).await? {
            Some(bytes) => {
                debug!(function = %self.function, key = %site.key, "cache hit");
                let value = site.coder.decode(&bytes)?;
                Ok(Some(value))
            }
            None => {
                debug!(function = %self.function, key = %site.key, "cache miss");
                Ok(None)
            }
        }
    }

    /// Write-back step. A backend failure here must not mask the computed
    /// result, so it is reported and swallowed; an encode failure still
    /// propagates since the value itself is at fault.
    async fn store<T: Serialize>(&self, site: &ResolvedSite, value: &T) -> Result<()> {
        let bytes = site.coder.encode(value)?;
        if let Err(err) = site.backend.set(&site.key, bytes, site.expire).await {
            warn!(
                function = %self.function,
                key = %site.key,
                error = %err,
                "failed to store computed result, returning it uncached"
            );
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::config::CacheConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn configured_cache() -> Arc<MemoCache> {
        let cache = Arc::new(MemoCache::new());
        cache.init(
            CacheConfig::builder(InMemoryBackend::new())
                .prefix("app")
                .expire(60)
                .build(),
        );
        cache
    }

    #[tokio::test]
    async fn test_second_call_is_a_hit() {
        let cache = configured_cache();
        let wrapped = cache.cached("tests::double");
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let result: u32 = wrapped
                .get_or_compute(KeyArgs::new().arg(&21).unwrap(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(result, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_arguments_compute_separately() {
        let cache = configured_cache();
        let wrapped = cache.cached("tests::identity");

        let a: u32 = wrapped
            .get_or_compute(KeyArgs::new().arg(&1).unwrap(), || async { Ok(1) })
            .await
            .unwrap();
        let b: u32 = wrapped
            .get_or_compute(KeyArgs::new().arg(&2).unwrap(), || async { Ok(2) })
            .await
            .unwrap();

        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn test_global_bypass_always_computes_and_never_writes() {
        let cache = configured_cache();
        cache.set_enable(false);
        let wrapped = cache.cached("tests::bypass");
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let _: u32 = wrapped
                .get_or_compute(KeyArgs::new(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Nothing was written while disabled
        assert_eq!(cache.clear(None, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_per_site_opt_out() {
        let cache = configured_cache();
        let wrapped = cache.cached("tests::opt_out").enabled(false);
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let _: u32 = wrapped
                .get_or_compute(KeyArgs::new(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_computation_error_propagates_and_stores_nothing() {
        let cache = configured_cache();
        let wrapped = cache.cached("tests::failing");
        let calls = Arc::new(AtomicU32::new(0));

        for expected_calls in 1..=2u32 {
            let calls_for_closure = Arc::clone(&calls);
            let result: Result<u32> = wrapped
                .get_or_compute(KeyArgs::new().arg(&5).unwrap(), || async move {
                    calls_for_closure.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("upstream unavailable")
                })
                .await;

            assert!(matches!(result, Err(CacheError::Compute(_))));
            // The failure was not cached; the computation ran again
            assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
        }
    }

    #[tokio::test]
    async fn test_decode_failure_surfaces_not_recomputes() {
        let cache = configured_cache();
        let calls = Arc::new(AtomicU32::new(0));

        // Store a string under the site's key
        let as_string = cache.cached("tests::conflicted");
        let _: String = as_string
            .get_or_compute(KeyArgs::new().arg(&1).unwrap(), || async {
                Ok("hello".to_string())
            })
            .await
            .unwrap();

        // Same function identity and arguments, incompatible target type
        let as_number = cache.cached("tests::conflicted");
        let counting = Arc::clone(&calls);
        let result: Result<u32> = as_number
            .get_or_compute(KeyArgs::new().arg(&1).unwrap(), || async move {
                counting.fetch_add(1, Ordering::SeqCst);
                Ok(9)
            })
            .await;

        assert!(matches!(result, Err(CacheError::Decode { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "decode failure must not recompute");
    }

    // == Write-Path Shielding ==
    #[derive(Debug)]
    struct WriteFailingBackend {
        inner: InMemoryBackend,
    }

    #[async_trait]
    impl Backend for WriteFailingBackend {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _expire: Option<u64>) -> Result<()> {
            Err(CacheError::Backend("store unavailable".to_string()))
        }

        async fn clear(&self, namespace: Option<&str>, key: Option<&str>) -> Result<u64> {
            self.inner.clear(namespace, key).await
        }
    }

    #[tokio::test]
    async fn test_store_failure_does_not_mask_result() {
        let cache = Arc::new(MemoCache::new());
        cache.init(
            CacheConfig::builder(WriteFailingBackend {
                inner: InMemoryBackend::new(),
            })
            .build(),
        );
        let wrapped = cache.cached("tests::unstorable");

        let result: u32 = wrapped
            .get_or_compute(KeyArgs::new(), || async { Ok(13) })
            .await
            .unwrap();

        assert_eq!(result, 13);
    }

    // == Blocking Bridge ==
    #[tokio::test]
    async fn test_blocking_computation_is_cached() {
        let cache = configured_cache();
        let wrapped = cache.cached("tests::blocking");
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let result: u64 = wrapped
                .get_or_compute_blocking(KeyArgs::new().arg(&"x").unwrap(), move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(99)
                })
                .await
                .unwrap();
            assert_eq!(result, 99);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocking_error_propagates() {
        let cache = configured_cache();
        let wrapped = cache.cached("tests::blocking_fail");

        let result: Result<u64> = wrapped
            .get_or_compute_blocking(KeyArgs::new(), || anyhow::bail!("disk on fire"))
            .await;

        match result {
            Err(CacheError::Compute(err)) => {
                assert!(err.to_string().contains("disk on fire"));
            }
            other => panic!("expected Compute error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expire_override_beats_global_default() {
        let cache = configured_cache(); // global expire 60
        let wrapped = cache.cached("tests::short_lived").expire(1);

        let _: u32 = wrapped
            .get_or_compute(KeyArgs::new(), || async { Ok(1) })
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let counting = Arc::clone(&calls);
        let _: u32 = wrapped
            .get_or_compute(KeyArgs::new(), || async move {
                counting.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1, "entry should have expired");
    }
}
