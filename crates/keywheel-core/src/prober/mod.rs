//! Active health probing
//!
//! Issues minimal synthetic requests through a [`ProbeTransport`] to test
//! credentials, classifies the results, and drives a throttled sequential
//! batch over many credentials. Transport errors never escape: everything
//! is converted to [`ProbeOutcome`] values at this boundary.

mod batch;
mod classify;

#[cfg(test)]
mod tests;

pub use batch::probe_batch;

use std::time::Instant;

use chrono::{DateTime, Utc};
use keywheel_types::{BalancePolicy, KeyRecord, ProbeOutcome};
use tracing::debug;

use crate::tracker::record_outcome;
use crate::transport::{FirstByte, ProbeMode, ProbeRequest, ProbeTransport};

use classify::classify;

/// Probe one credential and classify the result.
///
/// In `Await` mode the probe waits for full completion of the response. In
/// `FirstByte` mode the arrival of the first data unit counts as success
/// and the in-flight call is abandoned; a stream that ends without any
/// data is an error. Never returns `Err` and never panics.
pub async fn probe_one(
    transport: &dyn ProbeTransport,
    key: &KeyRecord,
    request: &ProbeRequest,
    mode: ProbeMode,
) -> ProbeOutcome {
    let started = Instant::now();

    let error = match mode {
        ProbeMode::Await => match transport.send(request, &key.secret).await {
            Ok(_) => None,
            Err(e) => Some(e),
        },
        ProbeMode::FirstByte => match transport.send_first_byte(request, &key.secret).await {
            Ok(FirstByte::Received) => None,
            Ok(FirstByte::EmptyStream) => {
                return ProbeOutcome::Error { message: "no data received".to_string() };
            }
            Err(e) => Some(e),
        },
    };

    let outcome = match error {
        None => ProbeOutcome::Success { response_time_ms: started.elapsed().as_millis() as u64 },
        Some(err) => classify(&err),
    };

    debug!(key_id = %key.id, key = %key.label(), outcome = %outcome, "Probed key");
    outcome
}

/// Fold a probe outcome into the key's record.
///
/// Thin delegation to [`record_outcome`] so probing feeds the same state
/// machine as live traffic.
pub fn apply_outcome(
    key: &KeyRecord,
    outcome: &ProbeOutcome,
    policy: &BalancePolicy,
    now: DateTime<Utc>,
) -> KeyRecord {
    record_outcome(key, outcome, policy, now)
}
