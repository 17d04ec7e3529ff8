//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against a server:
//!     → timeouts.rs (optional per-attempt deadline)
//!     → On failure: retries.rs (classify, spend budget)
//!     → backoff.rs (optional delay before the next server)
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried, and never against the same server
//! - Retry budget is per query, fixed at build time
//! - No deadline and no backoff unless configured

pub mod backoff;
pub mod retries;
pub mod timeouts;
