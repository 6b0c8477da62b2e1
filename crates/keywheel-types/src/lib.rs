//! # Keywheel Types
//!
//! Key records, balancing policy, and error definitions for Keywheel.
//!
//! This crate provides the foundational type system for the Keywheel
//! credential pool:
//!
//! - **`error`** - Typed error hierarchy for pool validation and probe transports
//! - **`models`** - Domain models (KeyRecord, BalancePolicy, ProbeOutcome, ...)
//!
//! ## Architecture Role
//!
//! `keywheel-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          keywheel-types (this crate)
//!                  │
//!                  ▼
//!           keywheel-core
//!                  │
//!                  ▼
//!     embedding application (storage, upstream protocol, UI)
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde so the caller can persist them as-is
//! - **Clone** for cheap value-snapshot semantics across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{KeyPoolError, TransportError};

// Re-export core model types
pub use models::{
    BalancePolicy, BalanceStrategy, BatchProgress, KeyRecord, KeyStatus, KeyUsage, ProbeOutcome,
    SelectionReason, SelectionResult,
};
