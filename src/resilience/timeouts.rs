//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound a single attempt or probe with an optional deadline
//! - Report expiry as a transport timeout, so it is retried like any other
//!   unreachable server

use std::future::Future;
use std::time::Duration;

use crate::error::{ExecuteError, TransportError};

/// Await `fut`, failing with `TransportError::Timeout` once `limit` elapses.
/// `None` waits as long as the future takes.
pub async fn with_timeout<F, T>(limit: Option<Duration>, fut: F) -> Result<T, ExecuteError>
where
    F: Future<Output = Result<T, ExecuteError>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit).into()),
        },
        None => fut.await,
    }
}
