//! In-process store. Used for local runs and as the emulated store in tests.

use async_trait::async_trait;
use dashmap::DashMap;

use counter_core::StoreError;

use super::{check_key, IncrementStore};

#[derive(Default)]
pub struct MemoryStore {
    counters: DashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, if the key was ever incremented or set.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.counters.get(key).map(|v| *v)
    }

    pub fn set(&self, key: impl Into<String>, value: i64) {
        self.counters.insert(key.into(), value);
    }
}

#[async_trait]
impl IncrementStore for MemoryStore {
    async fn atomic_increment(&self, key: &str) -> Result<i64, StoreError> {
        check_key(key)?;

        // The entry guard holds the shard write lock, so read-modify-write is atomic.
        let mut slot = self.counters.entry(key.to_owned()).or_insert(0);
        let next = slot
            .checked_add(1)
            .ok_or_else(|| StoreError::Reply("ERR increment or decrement would overflow".into()))?;
        *slot = next;
        Ok(next)
    }
}
