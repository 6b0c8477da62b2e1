//! Core domain models for Keywheel.
//!
//! This module contains the data structures shared between the pool logic
//! in `keywheel-core` and the embedding application that persists them.

mod key;
mod policy;
mod probe;
mod selection;

// Re-export all models
pub use key::{KeyRecord, KeyStatus, KeyUsage};
pub use policy::{BalancePolicy, BalanceStrategy};
pub use probe::{BatchProgress, ProbeOutcome};
pub use selection::{SelectionReason, SelectionResult};
