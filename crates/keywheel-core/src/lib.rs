//! # Keywheel Core
//!
//! Credential pool balancing, health tracking, and probing.
//!
//! ## Architecture
//!
//! ```text
//! keywheel-core/src/
//! ├── tracker.rs    # Fold probe/request outcomes into key records
//! ├── selector/     # Four-strategy selection over a pool snapshot
//! ├── sweep.rs      # Pool-wide cooldown recovery pass
//! ├── prober/       # Single + throttled batch probing, outcome classification
//! └── transport/    # ProbeTransport trait + reqwest-backed adapter
//! ```
//!
//! Every operation takes a pool snapshot and a policy as input and returns
//! new values; the caller owns persistence and concurrency control.
//! Probing is the only I/O path, and it never lets a transport error
//! escape: everything is folded into `ProbeOutcome` values.

pub mod prober;
pub mod selector;
pub mod sweep;
pub mod tracker;
pub mod transport;

// Re-export commonly used entry points
pub use prober::{apply_outcome, probe_batch, probe_one};
pub use selector::select_key;
pub use sweep::sweep;
pub use tracker::{is_recovery_due, record_outcome, try_recover};
pub use transport::{
    AuthPlacement, FirstByte, HttpProbeTransport, HttpTransportConfig, ProbeMode, ProbeRequest,
    ProbeResponse, ProbeTransport,
};
