//! Key selection
//!
//! Picks the next usable credential from a pool snapshot under one of four
//! strategies. Selection is pure given `(pool, policy, now)` apart from the
//! `Random` strategy, and `O(n log n)` at worst, so it is safe to run on
//! every outgoing request. The caller serializes writes of the returned
//! record back into the stored pool.

use chrono::{DateTime, Utc};
use keywheel_types::{
    BalancePolicy, BalanceStrategy, KeyRecord, KeyStatus, SelectionReason, SelectionResult,
};
use rand::Rng;
use tracing::debug;

use crate::tracker::{is_recovery_due, try_recover};


/// A pool member that survived availability filtering.
struct Candidate<'a> {
    record: &'a KeyRecord,
    /// Demoted key whose cooldown has elapsed; healed if chosen.
    needs_recovery: bool,
}

/// Select the next key from `pool` under `policy`.
///
/// Keys with `status` `Error` or `RateLimited` participate only once their
/// cooldown has elapsed, and the one that gets chosen is returned already
/// healed (Active, zero consecutive failures): selection has the side
/// effect of recovering the record it hands out. The caller must persist
/// both the returned record and `next_round_robin_cursor`.
pub fn select_key(
    pool: &[KeyRecord],
    policy: &BalancePolicy,
    now: DateTime<Utc>,
) -> SelectionResult {
    let enabled: Vec<&KeyRecord> = pool.iter().filter(|k| k.enabled).collect();
    if enabled.is_empty() {
        return SelectionResult::no_keys(policy.round_robin_cursor);
    }

    let survivors: Vec<Candidate<'_>> = enabled
        .into_iter()
        .filter_map(|key| match key.status {
            KeyStatus::Disabled => None,
            KeyStatus::Active => Some(Candidate { record: key, needs_recovery: false }),
            KeyStatus::Error | KeyStatus::RateLimited => is_recovery_due(key, policy, now)
                .then_some(Candidate { record: key, needs_recovery: true }),
        })
        .collect();

    if survivors.is_empty() {
        return SelectionResult::no_available_keys(policy.round_robin_cursor);
    }

    let (chosen, next_cursor) = match policy.strategy {
        BalanceStrategy::Priority => (pick_priority(&survivors), policy.round_robin_cursor),
        BalanceStrategy::LeastUsed => (pick_least_used(&survivors), policy.round_robin_cursor),
        BalanceStrategy::Random => (pick_random(&survivors), policy.round_robin_cursor),
        BalanceStrategy::RoundRobin => pick_round_robin(&survivors, policy.round_robin_cursor),
    };

    let key = if chosen.needs_recovery {
        try_recover(chosen.record, policy, now)
    } else {
        chosen.record.clone()
    };

    debug!(
        key_id = %key.id,
        strategy = %policy.strategy,
        recovered = chosen.needs_recovery,
        survivors = survivors.len(),
        "Selected key"
    );

    SelectionResult {
        key: Some(key),
        reason: SelectionReason::Strategy(policy.strategy),
        next_round_robin_cursor: next_cursor,
    }
}

/// Minimum priority value wins; ties broken by input order.
///
/// `Iterator::min_by_key` returns the last minimum on ties, so scan
/// explicitly to keep the first one.
fn pick_priority<'a, 'b>(survivors: &'b [Candidate<'a>]) -> &'b Candidate<'a> {
    let mut best = &survivors[0];
    for candidate in &survivors[1..] {
        if candidate.record.priority < best.record.priority {
            best = candidate;
        }
    }
    best
}

/// Fewest total requests wins; ties broken by input order.
fn pick_least_used<'a, 'b>(survivors: &'b [Candidate<'a>]) -> &'b Candidate<'a> {
    let mut best = &survivors[0];
    for candidate in &survivors[1..] {
        if candidate.record.usage.total_requests < best.record.usage.total_requests {
            best = candidate;
        }
    }
    best
}

/// Uniform random pick.
fn pick_random<'a, 'b>(survivors: &'b [Candidate<'a>]) -> &'b Candidate<'a> {
    let idx = rand::thread_rng().gen_range(0..survivors.len());
    &survivors[idx]
}

/// Rotate through the survivors in id order.
///
/// Sorting by id gives a deterministic total order regardless of how the
/// caller ordered the snapshot, so consecutive calls with an advancing
/// cursor visit every survivor exactly once before repeating.
fn pick_round_robin<'a, 'b>(
    survivors: &'b [Candidate<'a>],
    cursor: u64,
) -> (&'b Candidate<'a>, u64) {
    let mut ordered: Vec<&Candidate<'a>> = survivors.iter().collect();
    ordered.sort_by(|a, b| a.record.id.cmp(&b.record.id));

    let len = ordered.len() as u64;
    let index = (cursor % len) as usize;
    let next_cursor = (index as u64 + 1) % len;
    (ordered[index], next_cursor)
}
