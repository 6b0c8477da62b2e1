//! Probe transport errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a probe transport can report back to the prober.
///
/// The prober catches every variant and classifies it into a
/// [`ProbeOutcome`](crate::models::ProbeOutcome); none of these propagate
/// past the prober boundary.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum TransportError {
    /// The upstream answered with a failure (non-2xx status, protocol error)
    #[error("Upstream error: {message}")]
    Upstream {
        /// Status line and truncated body from the upstream
        message: String,
    },

    /// The request exceeded the transport's own timeout
    #[error("Request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before the transport gave up
        elapsed_ms: u64,
    },

    /// The request never reached the upstream (DNS, TCP, TLS)
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure
        message: String,
    },
}
