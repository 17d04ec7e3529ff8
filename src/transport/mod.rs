//! Transport subsystem: the capabilities the router consumes.
//!
//! # Data Flow
//! ```text
//! Dispatcher ──execute(server, query)──▶ QueryExecutor ──▶ search server
//! HealthObserver ──probe(server)──────▶ HealthProber  ──▶ search server
//! ```
//!
//! # Design Decisions
//! - The wire protocol lives behind these traits; the router never decodes payloads
//! - Implementations classify their own failures into `ExecuteError`
//! - http.rs is the bundled implementation (reqwest, GET with query parameters)

pub mod http;

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::error::ExecuteError;
use crate::registry::Server;

pub use http::{HttpExecutor, HttpProber, HttpQuery, HttpResponse};

/// Runs one query against one server.
pub trait QueryExecutor: Send + Sync + 'static {
    type Query: Send + Sync + 'static;
    type Response: Send + 'static;

    fn execute<'a>(
        &'a self,
        server: &'a Server,
        query: &'a Self::Query,
    ) -> BoxFuture<'a, Result<Self::Response, ExecuteError>>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    type Query = T::Query;
    type Response = T::Response;

    fn execute<'a>(
        &'a self,
        server: &'a Server,
        query: &'a Self::Query,
    ) -> BoxFuture<'a, Result<Self::Response, ExecuteError>> {
        (**self).execute(server, query)
    }
}

/// Checks whether a server is reachable and serving.
pub trait HealthProber: Send + Sync + 'static {
    fn probe<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, Result<(), ExecuteError>>;
}

impl<T: HealthProber + ?Sized> HealthProber for Arc<T> {
    fn probe<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, Result<(), ExecuteError>> {
        (**self).probe(server)
    }
}
