//! Recovery sweep
//!
//! Pool-wide application of the cooldown recovery rule, independent of
//! selection. Intended for periodic or pre-selection invocation; it is a
//! pure map over the snapshot it receives, so it carries no concurrency
//! hazard of its own.

use chrono::{DateTime, Utc};
use keywheel_types::{BalancePolicy, KeyRecord};
use tracing::debug;

use crate::tracker::try_recover;

/// Apply [`try_recover`] to every record in the pool.
///
/// Returns the pool unchanged when `auto_recovery_enabled` is off.
pub fn sweep(pool: &[KeyRecord], policy: &BalancePolicy, now: DateTime<Utc>) -> Vec<KeyRecord> {
    if !policy.auto_recovery_enabled {
        return pool.to_vec();
    }

    let mut recovered = 0usize;
    let swept: Vec<KeyRecord> = pool
        .iter()
        .map(|key| {
            let updated = try_recover(key, policy, now);
            if updated.status != key.status {
                recovered += 1;
            }
            updated
        })
        .collect();

    if recovered > 0 {
        debug!(recovered, pool_size = swept.len(), "Recovery sweep healed keys");
    }

    swept
}
