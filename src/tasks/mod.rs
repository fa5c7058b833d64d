//! Tasks Module
//!
//! Worker pool for blocking computations and the optional background TTL
//! sweeper.

mod cleanup;
mod pool;

pub use cleanup::spawn_cleanup_task;
pub use pool::BlockingPool;
