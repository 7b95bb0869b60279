//! Shared application state for the counter gateway.
//!
//! Built once at startup and cloned into every request.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CounterConfig;
use crate::counter::{Counter, IncreaseCounter};
use crate::store::IncrementStore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    counter: Arc<dyn IncreaseCounter>,
    request_timeout: Duration,
}

impl AppState {
    /// Bind the counter to `store` under the configured key.
    pub fn new(cfg: &CounterConfig, store: Arc<dyn IncrementStore>) -> Self {
        let counter = Counter::new(store, cfg.store.key.clone());
        Self::with_counter(Arc::new(counter), cfg.server.request_timeout())
    }

    /// Build state around any counter implementation (test doubles included).
    pub fn with_counter(counter: Arc<dyn IncreaseCounter>, request_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                counter,
                request_timeout,
            }),
        }
    }

    pub fn counter(&self) -> &dyn IncreaseCounter {
        self.inner.counter.as_ref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }
}
