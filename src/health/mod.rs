//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (observer.rs)
//!     → probe every registry entry concurrently, including failed ones
//!     → consecutive success/failure streak per address
//!     → threshold reached: set status in the registry
//! ```
//!
//! # Design Decisions
//! - Probes are independent: a slow or failing probe never delays its siblings
//! - Probe failures are logged and swallowed; they never reach query callers
//! - State transitions require consecutive successes/failures (thresholds default to 1)

pub mod observer;

pub use observer::HealthObserver;
