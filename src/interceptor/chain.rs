//! Interceptor composition.

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::error::ExecuteError;
use crate::registry::Server;
use crate::transport::QueryExecutor;

/// Middleware around the execution of a single request against one server.
pub trait RequestInterceptor<Q, R>: Send + Sync
where
    Q: Send + Sync + 'static,
    R: Send + 'static,
{
    fn intercept<'a>(
        &'a self,
        server: &'a Server,
        request: &'a Q,
        next: Next<'a, Q, R>,
    ) -> BoxFuture<'a, Result<R, ExecuteError>>;
}

/// The rest of the chain after the current interceptor.
pub struct Next<'a, Q, R>
where
    Q: Send + Sync + 'static,
    R: Send + 'static,
{
    remaining: &'a [Arc<dyn RequestInterceptor<Q, R>>],
    executor: &'a dyn QueryExecutor<Query = Q, Response = R>,
}

impl<'a, Q, R> Next<'a, Q, R>
where
    Q: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Chain `interceptors` in front of `executor`.
    pub fn new(
        interceptors: &'a [Arc<dyn RequestInterceptor<Q, R>>],
        executor: &'a dyn QueryExecutor<Query = Q, Response = R>,
    ) -> Self {
        Self {
            remaining: interceptors,
            executor,
        }
    }

    /// Invoke the next interceptor, or the executor at the end of the chain.
    pub fn run(self, server: &'a Server, request: &'a Q) -> BoxFuture<'a, Result<R, ExecuteError>> {
        match self.remaining.split_first() {
            Some((current, rest)) => current.intercept(
                server,
                request,
                Next {
                    remaining: rest,
                    executor: self.executor,
                },
            ),
            None => self.executor.execute(server, request),
        }
    }

    /// Interceptors still to run after the current one.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}
