//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for applications embedding the router
//! - Let `RUST_LOG` override the configured level
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! application's call.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `fmt` subscriber filtered at `level` (e.g. "info",
/// "search_router=debug"). `RUST_LOG` takes precedence when set.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
