//! Blocking Worker Pool
//!
//! Bounded submit-and-await bridge that lets blocking computations run off
//! the async scheduler.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{CacheError, Result};

// == Blocking Pool ==
/// Bounded pool for blocking computations.
///
/// `run` suspends the caller until a worker slot is free and the task has
/// completed, so the async scheduler itself is never blocked. If the caller
/// is cancelled while suspended, the task's result is discarded; the worker
/// itself is not forcibly interrupted.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
}

impl BlockingPool {
    // == Constructor ==
    /// Creates a pool with at most `max_workers` concurrent tasks.
    pub fn new(max_workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    // == Submit And Await ==
    /// Runs a blocking task on the pool and awaits its output.
    ///
    /// A panicking task surfaces as [`CacheError::Internal`].
    pub async fn run<T, F>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| CacheError::Internal("worker pool closed".to_string()))?;

        let handle = tokio::task::spawn_blocking(move || {
            let output = task();
            drop(permit);
            output
        });

        handle
            .await
            .map_err(|err| CacheError::Internal(format!("blocking worker failed: {err}")))
    }

    // == Available Workers ==
    /// Returns the number of currently free worker slots.
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }
}
