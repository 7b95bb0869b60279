//! The counter operation: one store, one key, one increment per call.

use std::sync::Arc;

use async_trait::async_trait;

use counter_core::error::{CounterError, CounterValue, Result};

use crate::store::IncrementStore;

/// Key the counter lives under unless configured otherwise.
pub const COUNTER_KEY: &str = "counter";
/// Operation name attached to store failures.
pub const OP_INCREASE: &str = "increase counter";

/// Increments the counter and returns its new value.
#[async_trait]
pub trait IncreaseCounter: Send + Sync {
    async fn increase(&self) -> Result<CounterValue>;
}

/// [`IncreaseCounter`] bound to a store and a key.
///
/// Holds no state of its own; concurrent callers rely on the store's
/// atomic increment for unique values.
pub struct Counter {
    store: Arc<dyn IncrementStore>,
    key: String,
}

impl Counter {
    pub fn new(store: Arc<dyn IncrementStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl IncreaseCounter for Counter {
    async fn increase(&self) -> Result<CounterValue> {
        let next = self
            .store
            .atomic_increment(&self.key)
            .await
            .map_err(|source| CounterError::StoreUnavailable {
                op: OP_INCREASE,
                source,
            })?;

        narrow(next)
    }
}

/// Convert a store value to a narrower reporting type, failing instead of
/// truncating.
pub fn narrow<T: TryFrom<i64>>(value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| CounterError::EncodingImpossible { value })
}
