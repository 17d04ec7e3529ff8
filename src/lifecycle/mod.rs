//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Client build:
//!     health observation enabled → task.rs spawns the observer loop
//!
//! Client shutdown (any number of calls):
//!     first call → shutdown.rs fires → loop exits → task joined
//!     later calls → no-op
//! ```
//!
//! # Design Decisions
//! - Exactly one owner per background task
//! - In-flight queries are never cancelled by shutdown

pub mod shutdown;
pub mod task;

pub use shutdown::Shutdown;
pub use task::BackgroundTask;
