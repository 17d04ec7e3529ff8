//! Logging interceptor.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::time::Instant;

use crate::error::ExecuteError;
use crate::interceptor::{Next, RequestInterceptor};
use crate::registry::Server;

/// Emits one `debug` event per request with server, elapsed time and outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

impl<Q, R> RequestInterceptor<Q, R> for LoggingInterceptor
where
    Q: Send + Sync + 'static,
    R: Send + 'static,
{
    fn intercept<'a>(
        &'a self,
        server: &'a Server,
        request: &'a Q,
        next: Next<'a, Q, R>,
    ) -> BoxFuture<'a, Result<R, ExecuteError>> {
        async move {
            let start = Instant::now();
            let result = next.run(server, request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::debug!(server = %server.address(), elapsed_ms, "Request completed"),
                Err(e) => tracing::debug!(server = %server.address(), elapsed_ms, error = %e, "Request failed"),
            }
            result
        }
        .boxed()
    }
}
