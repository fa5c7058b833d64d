//! Redis Backend Module
//!
//! External-store backend over a pre-constructed async Redis connection.
//! TTLs map to the store's native expiry; namespace clearing enumerates
//! keys with cursor-batched SCAN since Redis has no prefix-delete.

use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::backend::Backend;
use crate::error::{CacheError, Result};

/// Keys fetched per SCAN round trip
const SCAN_BATCH: u64 = 100;

// == Redis Backend ==
/// Backend delegating to a Redis server.
///
/// Consumes a pre-constructed [`ConnectionManager`]; connection lifecycle,
/// reconnects and retries are the manager's concern, not this crate's.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    // == Constructor ==
    /// Creates a backend over an established connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend").finish()
    }
}

#[async_trait]
impl Backend for RedisBackend {
    // == Get ==
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    // == Set ==
    /// Stores the value, passing the TTL as native `SET … EX`.
    async fn set(&self, key: &str, value: Vec<u8>, expire: Option<u64>) -> Result<()> {
        let mut conn = self.conn.clone();
        match expire {
            Some(seconds) => {
                let _: () = redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("EX")
                    .arg(seconds)
                    .query_async(&mut conn)
                    .await?;
            }
            None => {
                let _: () = redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .query_async(&mut conn)
                    .await?;
            }
        }
        Ok(())
    }

    // == Clear ==
    /// Deletes by exact key or by namespace SCAN; returns keys actually
    /// deleted. A bare clear is refused rather than flushing a database
    /// that may be shared with other applications.
    async fn clear(&self, namespace: Option<&str>, key: Option<&str>) -> Result<u64> {
        let mut conn = self.conn.clone();

        if let Some(key) = key {
            let removed: u64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
            return Ok(removed);
        }

        if let Some(namespace) = namespace {
            let pattern = format!("{namespace}:*");
            let mut removed: u64 = 0;
            let mut cursor: u64 = 0;

            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await?;

                if !batch.is_empty() {
                    let deleted: u64 =
                        redis::cmd("DEL").arg(&batch).query_async(&mut conn).await?;
                    removed += deleted;
                }

                cursor = next;
                if cursor == 0 {
                    break;
                }
            }

            return Ok(removed);
        }

        Err(CacheError::Backend(
            "refusing to clear the entire database; pass a namespace or key".to_string(),
        ))
    }
}
