//! Transport layer (HTTP/1).
//!
//! Exposes the counter request handler and the accept loop that serves it
//! with a bounded header-read timeout.

pub mod http;
pub mod serve;
