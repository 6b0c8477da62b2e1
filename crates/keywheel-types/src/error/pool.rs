//! Key pool errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while manipulating key records and pools.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum KeyPoolError {
    /// A field failed validation (e.g., priority out of range)
    #[error("Validation error for {field}: {message}")]
    Validation {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Every key in the pool is demoted or disabled
    #[error("Key pool exhausted: {reason}")]
    PoolExhausted {
        /// Explanation of why no keys are available
        reason: String,
    },
}

impl KeyPoolError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }
}
