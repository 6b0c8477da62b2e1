//! Selection result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BalanceStrategy, KeyRecord};

/// Why a selection produced (or failed to produce) a key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "reason", content = "strategy")]
pub enum SelectionReason {
    /// Pool contains no enabled keys
    NoKeys,
    /// Enabled keys exist but all are demoted or manually disabled
    NoAvailableKeys,
    /// A key was chosen by the named strategy
    Strategy(BalanceStrategy),
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoKeys => write!(f, "no_keys"),
            Self::NoAvailableKeys => write!(f, "no_available_keys"),
            Self::Strategy(strategy) => write!(f, "strategy_{strategy}"),
        }
    }
}

/// Outcome of one selection pass over a pool snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionResult {
    /// The chosen key, already healed if it was a cooled-down candidate.
    /// The caller is responsible for writing it back to the pool.
    pub key: Option<KeyRecord>,
    /// Reason code for this result
    pub reason: SelectionReason,
    /// Round-robin cursor for the caller to persist; unchanged unless the
    /// round-robin strategy picked a key
    pub next_round_robin_cursor: u64,
}

impl SelectionResult {
    /// Result for a pool with no enabled keys.
    pub const fn no_keys(cursor: u64) -> Self {
        Self { key: None, reason: SelectionReason::NoKeys, next_round_robin_cursor: cursor }
    }

    /// Result for a pool where every enabled key is unavailable.
    pub const fn no_available_keys(cursor: u64) -> Self {
        Self {
            key: None,
            reason: SelectionReason::NoAvailableKeys,
            next_round_robin_cursor: cursor,
        }
    }
}
