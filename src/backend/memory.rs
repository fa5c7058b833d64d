//! In-Memory Backend Module
//!
//! In-process key-value store with lazy TTL expiry. Grows unbounded until
//! entries expire or are cleared.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{Backend, BackendStats, StoredEntry};
use crate::error::Result;

// == Inner State ==
#[derive(Debug, Default)]
struct Inner {
    /// Key-value storage
    entries: HashMap<String, StoredEntry>,
    /// Read performance counters
    stats: BackendStats,
}

// == In-Memory Backend ==
/// In-process backend backed by a `HashMap` behind an async `RwLock`.
///
/// Expiry is lazy: entries are checked at read time and removed when their
/// TTL has elapsed. A background sweeper is optional, see
/// [`spawn_cleanup_task`](crate::tasks::spawn_cleanup_task).
///
/// Cloning is cheap and clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryBackend {
    // == Constructor ==
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    // == Stats ==
    /// Returns current backend statistics.
    pub async fn stats(&self) -> BackendStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns the number removed.
    ///
    /// Called by the optional background sweeper; correctness does not
    /// depend on it since reads check expiry themselves.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let expired_keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            inner.entries.remove(&key);
            inner.stats.record_expired();
        }
        let total = inner.entries.len();
        inner.stats.set_total_entries(total);

        count
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    // == Get ==
    /// Retrieves a value, treating an expired entry as absent.
    ///
    /// Takes the write lock because an expired entry is removed on read.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let expired = inner
            .entries
            .get(key)
            .map(|entry| entry.is_expired())
            .unwrap_or(false);

        if expired {
            inner.entries.remove(key);
            let total = inner.entries.len();
            inner.stats.record_expired();
            inner.stats.record_miss();
            inner.stats.set_total_entries(total);
            return Ok(None);
        }

        match inner.entries.get(key) {
            Some(entry) => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                inner.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry and resetting its TTL.
    async fn set(&self, key: &str, value: Vec<u8>, expire: Option<u64>) -> Result<()> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        inner
            .entries
            .insert(key.to_string(), StoredEntry::new(value, expire));
        let total = inner.entries.len();
        inner.stats.set_total_entries(total);

        Ok(())
    }

    // == Clear ==
    /// Removes entries by exact key, by namespace prefix, or everything.
    async fn clear(&self, namespace: Option<&str>, key: Option<&str>) -> Result<u64> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let removed = if let Some(key) = key {
            if inner.entries.remove(key).is_some() {
                1
            } else {
                0
            }
        } else if let Some(namespace) = namespace {
            let prefix = format!("{namespace}:");
            let before = inner.entries.len();
            inner.entries.retain(|k, _| !k.starts_with(&prefix));
            (before - inner.entries.len()) as u64
        } else {
            let count = inner.entries.len() as u64;
            inner.entries.clear();
            count
        };

        let total = inner.entries.len();
        inner.stats.set_total_entries(total);

        Ok(removed)
    }
}
