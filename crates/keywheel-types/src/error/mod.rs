//! Typed error definitions for Keywheel.
//!
//! All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros
//!
//! Transport errors never escape `keywheel-core`: the prober converts them
//! into [`ProbeOutcome`](crate::models::ProbeOutcome) values at its boundary.

mod pool;
mod transport;

pub use pool::KeyPoolError;
pub use transport::TransportError;
