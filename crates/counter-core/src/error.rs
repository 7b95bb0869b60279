//! Shared error types across counter crates.

use std::error::Error as StdError;
use std::fmt::Write;
use std::io;

use thiserror::Error;

/// Integer width the service reports counters in (the platform integer).
/// The store itself works in `i64`.
pub type CounterValue = isize;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Backing store unreachable or returned an error.
    StoreUnavailable,
    /// Counter does not fit the reporting width.
    EncodingImpossible,
    /// Startup configuration rejected.
    BadConfig,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ClientCode::EncodingImpossible => "ENCODING_IMPOSSIBLE",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Failures of a single store round-trip.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connect {addr}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("store i/o")]
    Io(#[from] io::Error),
    #[error("store deadline exceeded")]
    Timeout,
    #[error("store replied with error: {0}")]
    Reply(String),
    #[error("store protocol: {0}")]
    Protocol(String),
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("{op}")]
    StoreUnavailable {
        op: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("counter value {value} does not fit the reporting width")]
    EncodingImpossible { value: i64 },
    #[error("send counter response")]
    TransportWrite(#[source] Box<dyn StdError + Send + Sync>),
    #[error("config: {0}")]
    Config(String),
    #[error("{op}")]
    Serve {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl CounterError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CounterError::StoreUnavailable { .. } => ClientCode::StoreUnavailable,
            CounterError::EncodingImpossible { .. } => ClientCode::EncodingImpossible,
            CounterError::Config(_) => ClientCode::BadConfig,
            CounterError::TransportWrite(_)
            | CounterError::Serve { .. } => ClientCode::Internal,
        }
    }
}

/// Render an error with its whole `source()` chain, outermost first:
/// `increase counter: connect 127.0.0.1:6379: Connection refused`.
pub fn report(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        let _ = write!(out, ": {cause}");
        cur = cause.source();
    }
    out
}
