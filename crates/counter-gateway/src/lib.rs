//! Counter gateway library entry.
//!
//! Wires configuration, the store adapters, the counter operation and the
//! HTTP transport into one service. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod app_state;
pub mod config;
pub mod counter;
pub mod router;
pub mod store;
pub mod transport;
