//! Key record model and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::KeyPoolError;

/// Lowest (most preferred) priority value.
pub const PRIORITY_MIN: u8 = 1;
/// Highest (least preferred) priority value.
pub const PRIORITY_MAX: u8 = 10;

/// Health status of a single credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// Key is healthy and available for selection
    #[default]
    Active,
    /// Key was manually deactivated; never assigned automatically
    Disabled,
    /// Key was demoted after repeated consecutive failures
    Error,
    /// Key hit an upstream rate limit
    RateLimited,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Active => write!(f, "active"),
            Self::Disabled => write!(f, "disabled"),
            Self::Error => write!(f, "error"),
            Self::RateLimited => write!(f, "rate_limited"),
        }
    }
}

impl KeyStatus {
    /// Parse from string. Unknown values fall back to `Active`.
    pub fn from_string(s: &str) -> Self {
        match s {
            "disabled" => Self::Disabled,
            "error" => Self::Error,
            "rate_limited" => Self::RateLimited,
            _ => Self::Active,
        }
    }

    /// Whether this status marks a demotion the recovery rule may undo.
    pub const fn is_demoted(&self) -> bool {
        matches!(self, Self::Error | Self::RateLimited)
    }
}

/// Usage counters for a single credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct KeyUsage {
    /// Total requests attempted with this key
    pub total_requests: u64,
    /// Requests that completed successfully
    pub successful_requests: u64,
    /// Requests that failed (errors and rate limits)
    pub failed_requests: u64,
    /// Failures since the last success; resets to 0 on every success
    pub consecutive_failures: u32,
    /// Timestamp of the most recent use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl KeyUsage {
    /// Success rate as a percentage (100.0 when never used).
    pub fn success_rate(&self) -> f64 {
        let total = self.successful_requests + self.failed_requests;
        if total == 0 {
            return 100.0;
        }
        (self.successful_requests as f64 / total as f64) * 100.0
    }
}

/// One credential plus its usage and status metadata.
///
/// Records are created once by the caller's persistence layer (which owns
/// id assignment and pool membership) and thereafter only mutated by the
/// tracker, selector, and recovery sweep in `keywheel-core`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyRecord {
    /// Unique, stable, creation-ordered identifier
    pub id: String,
    /// The credential value itself; never logged in full
    pub secret: String,
    /// Optional human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Manual on/off switch
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Selection priority, 1 (highest) to 10 (lowest)
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Optional per-minute request cap, enforced by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_minute_limit: Option<u32>,
    /// Usage counters
    #[serde(default)]
    pub usage: KeyUsage,
    /// Current health status
    #[serde(default)]
    pub status: KeyStatus,
    /// Message from the most recent failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state change; cooldowns are measured from here
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

const fn default_priority() -> u8 {
    5
}

impl KeyRecord {
    /// Create a new active record with the given caller-assigned id.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            secret: secret.into(),
            display_name: None,
            enabled: true,
            priority: default_priority(),
            per_minute_limit: None,
            usage: KeyUsage::default(),
            status: KeyStatus::Active,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the selection priority, rejecting values outside `1..=10`.
    pub fn set_priority(&mut self, priority: u8) -> Result<(), KeyPoolError> {
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
            return Err(KeyPoolError::Validation {
                field: "priority".to_string(),
                message: format!(
                    "priority must be between {PRIORITY_MIN} and {PRIORITY_MAX}, got {priority}"
                ),
            });
        }
        self.priority = priority;
        Ok(())
    }

    /// Whether the key can be considered by the selector at all.
    ///
    /// A demoted key (`Error`/`RateLimited`) is still selectable once its
    /// cooldown elapses; that check lives in `keywheel-core`.
    pub const fn is_selectable(&self) -> bool {
        self.enabled && !matches!(self.status, KeyStatus::Disabled)
    }

    /// Manually deactivate the key.
    ///
    /// This is the only path that assigns `KeyStatus::Disabled`; the
    /// tracker, selector, and prober never do.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.status = KeyStatus::Disabled;
        self.updated_at = Utc::now();
    }

    /// Manually reactivate the key, clearing any failure history.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.status = KeyStatus::Active;
        self.usage.consecutive_failures = 0;
        self.last_error = None;
        self.updated_at = Utc::now();
    }

    /// Redacted form of the secret, safe for logging.
    pub fn redacted_secret(&self) -> String {
        let chars: Vec<char> = self.secret.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }

    /// Display label: the name when present, otherwise the redacted secret.
    pub fn label(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| self.redacted_secret())
    }
}
