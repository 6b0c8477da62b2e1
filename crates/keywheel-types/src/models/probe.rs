//! Probe outcome and batch progress types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Result of probing a single credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", content = "details", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Upstream responded
    Success {
        /// Elapsed time until the probe was considered successful
        response_time_ms: u64,
    },
    /// Probe failed for a non-rate-limit reason
    Error {
        /// Failure description from the transport
        message: String,
    },
    /// Upstream signalled rate limiting
    RateLimited {
        /// Parsed retry-after hint, when the upstream provided one
        retry_after_seconds: Option<u64>,
    },
}

impl ProbeOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { response_time_ms } => write!(f, "success ({response_time_ms}ms)"),
            Self::Error { message } => write!(f, "error: {message}"),
            Self::RateLimited { retry_after_seconds: Some(secs) } => {
                write!(f, "rate limited (retry after {secs}s)")
            }
            Self::RateLimited { retry_after_seconds: None } => write!(f, "rate limited"),
        }
    }
}

/// Progress snapshot emitted while a batch probe runs.
///
/// A batch over `n` keys emits `n + 1` snapshots: one before each probe
/// and a final one with `completed == total` and no current key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchProgress {
    /// Number of keys in the batch
    pub total: usize,
    /// Probes finished so far
    pub completed: usize,
    /// Id of the key about to be probed, `None` on the final snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_key_id: Option<String>,
    /// Outcomes recorded so far, keyed by credential id
    pub results: HashMap<String, ProbeOutcome>,
}

impl BatchProgress {
    /// Whether this is the terminal snapshot of the batch.
    pub fn is_final(&self) -> bool {
        self.completed == self.total && self.current_key_id.is_none()
    }
}
