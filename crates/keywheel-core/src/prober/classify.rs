//! Transport error classification.

use keywheel_types::{ProbeOutcome, TransportError};
use regex::Regex;
use std::sync::OnceLock;

/// Message fragments that mark a failure as rate limiting rather than a
/// key-quality problem.
const RATE_LIMIT_MARKERS: [&str; 4] =
    ["rate limit", "too many requests", "429", "quota exceeded"];

fn retry_after_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)retry[- ]?after[:\s]*(\d+)").expect("static pattern compiles")
    })
}

/// Classify a transport error into a probe outcome.
///
/// Matching is case-insensitive over the error's display message. A
/// rate-limit match also tries to extract a `retry-after: <seconds>` hint
/// from the same message.
pub(super) fn classify(err: &TransportError) -> ProbeOutcome {
    let message = err.to_string();
    let lowered = message.to_lowercase();

    if RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return ProbeOutcome::RateLimited { retry_after_seconds: parse_retry_after(&message) };
    }

    ProbeOutcome::Error { message }
}

fn parse_retry_after(message: &str) -> Option<u64> {
    retry_after_pattern()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
