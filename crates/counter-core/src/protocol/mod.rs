//! Wire formats.
//!
//! - RESP: the request/reply framing spoken to the backing store.
//! - Response: the `counter: <N>` body returned to HTTP clients.
//!
//! Parsers are panic-free: malformed store replies are reported as
//! `StoreError::Protocol` instead of panicking or indexing raw buffers.

pub mod resp;
pub mod response;
