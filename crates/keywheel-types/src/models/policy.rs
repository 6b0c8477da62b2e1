//! Balancing policy and strategy enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule used to pick among currently-usable pool members.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStrategy {
    /// Rotate through the pool in id order
    #[default]
    RoundRobin,
    /// Lowest priority value wins (1 = highest priority)
    Priority,
    /// Fewest total requests wins
    LeastUsed,
    /// Uniform random pick
    Random,
}

impl fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::RoundRobin => write!(f, "round_robin"),
            Self::Priority => write!(f, "priority"),
            Self::LeastUsed => write!(f, "least_used"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl BalanceStrategy {
    /// Parse from string. Unknown values fall back to `RoundRobin`.
    pub fn from_string(s: &str) -> Self {
        match s {
            "priority" => Self::Priority,
            "least_used" => Self::LeastUsed,
            "random" => Self::Random,
            _ => Self::RoundRobin,
        }
    }
}

/// Pool balancing policy.
///
/// Every field has a serde default so a partially persisted policy
/// deserializes to the documented defaults instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalancePolicy {
    /// Selection strategy
    #[serde(default)]
    pub strategy: BalanceStrategy,
    /// Consecutive failures before a key is demoted to `Error`
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Minutes a demoted key must rest before recovery
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
    /// Whether the recovery sweep is active
    #[serde(default = "default_auto_recovery")]
    pub auto_recovery_enabled: bool,
    /// Caller-persisted round-robin position.
    ///
    /// This is the single authoritative cursor; selection returns the
    /// advanced value in `SelectionResult` for the caller to store.
    #[serde(default)]
    pub round_robin_cursor: u64,
}

const fn default_max_consecutive_failures() -> u32 {
    3
}

const fn default_cooldown_minutes() -> u32 {
    5
}

const fn default_auto_recovery() -> bool {
    true
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            strategy: BalanceStrategy::default(),
            max_consecutive_failures: default_max_consecutive_failures(),
            cooldown_minutes: default_cooldown_minutes(),
            auto_recovery_enabled: default_auto_recovery(),
            round_robin_cursor: 0,
        }
    }
}

impl BalancePolicy {
    /// Cooldown as a chrono duration.
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cooldown_minutes))
    }

    /// Copy of this policy with the cursor replaced.
    pub fn with_cursor(&self, cursor: u64) -> Self {
        Self { round_robin_cursor: cursor, ..self.clone() }
    }
}
