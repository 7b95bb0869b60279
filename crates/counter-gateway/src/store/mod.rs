//! Store adapters: the atomic-increment providers behind the counter.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;

use counter_core::StoreError;

use crate::config::{StoreBackend, StoreSection};

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// A store that can atomically increment an integer under a key.
///
/// Implementations must be linearizable per key: racing increments each
/// observe a distinct successor. Callers hold no lock of their own.
#[async_trait]
pub trait IncrementStore: Send + Sync {
    /// Increment `key` by one and return the new value. Missing keys start
    /// at zero.
    async fn atomic_increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Cheap reachability check. Never used on the request path.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Build the configured store. Remote stores dial lazily.
pub fn connect(cfg: &StoreSection) -> Arc<dyn IncrementStore> {
    match cfg.backend {
        StoreBackend::Redis => Arc::new(RedisStore::new(
            cfg.dial_addr(),
            cfg.timeout(),
            cfg.max_idle,
            cfg.max_open,
        )),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    }
}

fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::Protocol("key must not be empty".into()));
    }
    Ok(())
}
