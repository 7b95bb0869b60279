//! HTTP response body for a counter value.

use bytes::Bytes;

use crate::error::CounterValue;

/// Body prefix; the decimal value follows.
pub const PREFIX: &str = "counter: ";

/// Encode a counter as `counter: <N>`.
pub fn encode(counter: CounterValue) -> Bytes {
    Bytes::from(format!("{PREFIX}{counter}"))
}
