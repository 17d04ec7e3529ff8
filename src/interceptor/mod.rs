//! Request interceptor subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher (server already selected)
//!     → interceptor[0].intercept(server, request, next)
//!         → interceptor[1].intercept(server, request, next)
//!             → ...
//!                 → executor.execute(server, request)
//! ```
//!
//! # Design Decisions
//! - Outermost first, in configured order
//! - An interceptor either calls `next.run(..)` and passes the result through
//!   (possibly transformed) or answers itself
//! - Interceptors never choose servers or retry; that is the dispatcher's job

pub mod chain;
pub mod logging;

pub use chain::{Next, RequestInterceptor};
pub use logging::LoggingInterceptor;
