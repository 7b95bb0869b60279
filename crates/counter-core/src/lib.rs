//! counter core: transport-agnostic error taxonomy and wire formats.
//!
//! This crate defines the error surface shared by the gateway and its store
//! adapters, the RESP codec used to talk to the backing store, and the
//! response encoder for the HTTP body. It carries no runtime dependency so
//! the pure parts can be tested without a network or a store.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A malformed store reply must surface as `StoreError`, never crash the
//! process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{CounterError, CounterValue, Result, StoreError};
