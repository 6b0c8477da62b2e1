//! Status & usage tracking
//!
//! Pure functions that fold a probe or request outcome into a new key
//! record, and the shared cooldown-recovery rule used both inline by the
//! selector and pool-wide by the recovery sweep.

use chrono::{DateTime, Utc};
use keywheel_types::{BalancePolicy, KeyRecord, KeyStatus, ProbeOutcome};
use tracing::{debug, info, warn};

/// Fold an outcome into a copy of `key`.
///
/// Status transitions:
/// - `Success` always resets the key to `Active` with zero consecutive
///   failures, no matter the prior state.
/// - `Error` demotes to `Error` only once consecutive failures reach
///   `policy.max_consecutive_failures`; below the threshold the status is
///   left untouched.
/// - `RateLimited` sets `RateLimited` unconditionally but does NOT count
///   toward consecutive failures: being throttled says nothing about the
///   key's quality.
///
/// `KeyStatus::Disabled` is never assigned here; it is reserved for the
/// manual [`KeyRecord::disable`] path.
pub fn record_outcome(
    key: &KeyRecord,
    outcome: &ProbeOutcome,
    policy: &BalancePolicy,
    now: DateTime<Utc>,
) -> KeyRecord {
    let mut updated = key.clone();
    updated.usage.total_requests += 1;
    updated.usage.last_used_at = Some(now);
    updated.updated_at = now;

    match outcome {
        ProbeOutcome::Success { response_time_ms } => {
            updated.usage.successful_requests += 1;
            updated.usage.consecutive_failures = 0;
            updated.status = KeyStatus::Active;
            updated.last_error = None;
            debug!(
                key_id = %updated.id,
                response_time_ms,
                "Key probe/request succeeded"
            );
        }
        ProbeOutcome::Error { message } => {
            updated.usage.failed_requests += 1;
            updated.usage.consecutive_failures += 1;
            updated.last_error = Some(message.clone());

            if updated.usage.consecutive_failures >= policy.max_consecutive_failures {
                if updated.status != KeyStatus::Error {
                    warn!(
                        key_id = %updated.id,
                        key = %updated.label(),
                        consecutive_failures = updated.usage.consecutive_failures,
                        threshold = policy.max_consecutive_failures,
                        error = %message,
                        "Key demoted after repeated failures"
                    );
                }
                updated.status = KeyStatus::Error;
            }
        }
        ProbeOutcome::RateLimited { retry_after_seconds } => {
            updated.usage.failed_requests += 1;
            updated.last_error = Some(match retry_after_seconds {
                Some(secs) => format!("rate limited, retry after {secs}s"),
                None => "rate limited".to_string(),
            });
            updated.status = KeyStatus::RateLimited;
            debug!(
                key_id = %updated.id,
                retry_after_seconds = ?retry_after_seconds,
                "Key rate limited"
            );
        }
    }

    updated
}

/// Whether the cooldown for a demoted key has fully elapsed.
pub fn is_recovery_due(key: &KeyRecord, policy: &BalancePolicy, now: DateTime<Utc>) -> bool {
    key.status.is_demoted() && now - key.updated_at >= policy.cooldown()
}

/// Apply the recovery rule to a single record.
///
/// Returns an `Active`, zeroed-failure copy when the key is demoted and
/// its cooldown has elapsed; otherwise returns the record unchanged.
pub fn try_recover(key: &KeyRecord, policy: &BalancePolicy, now: DateTime<Utc>) -> KeyRecord {
    if !is_recovery_due(key, policy, now) {
        return key.clone();
    }

    let mut recovered = key.clone();
    recovered.status = KeyStatus::Active;
    recovered.usage.consecutive_failures = 0;
    recovered.last_error = None;
    recovered.updated_at = now;

    info!(
        key_id = %recovered.id,
        key = %recovered.label(),
        cooldown_minutes = policy.cooldown_minutes,
        "Key auto-recovered after cooldown"
    );

    recovered
}
