//! Top-level facade crate for the counter service.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.
//!
//! ```
//! use std::sync::Arc;
//!
//! use counter::core::protocol::response;
//! use counter::gateway::app_state::AppState;
//! use counter::gateway::config::CounterConfig;
//! use counter::gateway::router::build_router;
//! use counter::gateway::store::MemoryStore;
//!
//! let state = AppState::new(&CounterConfig::default(), Arc::new(MemoryStore::new()));
//! let _app = build_router(state);
//!
//! assert_eq!(&response::encode(1)[..], b"counter: 1");
//! ```

pub mod core {
    pub use counter_core::*;
}

pub mod gateway {
    pub use counter_gateway::*;
}
