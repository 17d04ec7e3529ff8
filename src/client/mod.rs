//! The query client.
//!
//! # Data Flow
//! ```text
//! Client::query(request)
//!     → dispatcher.rs: select → execute (interceptors) → classify → retry?
//!     → response, transformed value, or one terminal Error
//!
//! ClientBuilder::build()
//!     → registry + load balancer + dispatcher
//!     → health observer task (when enabled), stopped by Client::shutdown
//! ```

pub mod attempt;
pub mod builder;
pub(crate) mod dispatcher;

use std::fmt::Display;
use std::sync::Arc;

use crate::error::Result;
use crate::lifecycle::BackgroundTask;
use crate::load_balancer::LoadBalancer;
use crate::registry::ServerRegistry;
use crate::transport::QueryExecutor;

pub use attempt::RequestAttempt;
pub use builder::ClientBuilder;

use dispatcher::Dispatcher;

/// Routes queries across a set of interchangeable servers.
///
/// Cloning is cheap; clones share the registry, load balancer and health task.
pub struct Client<E: QueryExecutor> {
    inner: Arc<Inner<E>>,
}

pub(crate) struct Inner<E: QueryExecutor> {
    pub(crate) dispatcher: Dispatcher<E>,
    pub(crate) health: Option<BackgroundTask>,
}

impl<E: QueryExecutor> Clone for Client<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: QueryExecutor> Client<E> {
    pub fn builder(executor: E) -> ClientBuilder<E> {
        ClientBuilder::new(executor)
    }

    /// Run `request` against a selected server, failing over on transport errors.
    pub async fn query(&self, request: E::Query) -> Result<E::Response> {
        self.inner
            .dispatcher
            .dispatch(&request, Ok::<_, std::convert::Infallible>)
            .await
    }

    /// Like [`query`](Self::query), then apply `transform` to the response.
    /// A transform failure is reported as `Error::Transform` and never retried.
    pub async fn query_with<T, X, F>(&self, request: E::Query, transform: F) -> Result<T>
    where
        F: FnOnce(E::Response) -> std::result::Result<T, X>,
        X: Display,
    {
        self.inner.dispatcher.dispatch(&request, transform).await
    }

    /// Stop health observation. In-flight queries are left to finish.
    /// Idempotent; no probe is issued once the first call returns.
    pub async fn shutdown(&self) {
        if let Some(task) = &self.inner.health {
            if !task.is_stopped() {
                tracing::info!("Shutting down search router client");
            }
            task.stop().await;
        }
    }

    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.inner.dispatcher.registry
    }

    pub fn load_balancer(&self) -> &Arc<dyn LoadBalancer> {
        &self.inner.dispatcher.load_balancer
    }

    /// Replace the server list, keeping the status of servers that stay.
    ///
    /// The load balancer is told about the new membership so it can drop
    /// state kept for removed servers. A single-server strategy keeps its
    /// address and logs a warning when that address is gone.
    pub fn update_servers<I, S>(&self, addresses: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dispatcher = &self.inner.dispatcher;
        let changed = dispatcher.registry.sync(addresses);
        if changed {
            dispatcher
                .load_balancer
                .servers_changed(&dispatcher.registry.snapshot());
        }
        changed
    }
}
