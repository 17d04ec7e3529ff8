//! Client-side request router for a cluster of interchangeable search servers.
//!
//! A [`Client`] picks a server per query with a pluggable [`LoadBalancer`],
//! runs the query through an interceptor chain and a [`QueryExecutor`],
//! fails over to another replica on transport errors, and keeps server status
//! current with a background [`HealthObserver`].
//!
//! ```no_run
//! use search_router::{ClientBuilder, HttpQuery, Strategy};
//!
//! # async fn run() -> search_router::Result<()> {
//! let client = ClientBuilder::http()
//!     .servers(["http://solr1:8983/solr/core", "http://solr2:8983/solr/core"])
//!     .strategy(Strategy::FastestFirst { alpha: 0.3 })
//!     .build();
//!
//! let response = client.query(HttpQuery::new("select").param("q", "*:*")).await?;
//! println!("{}", response.body);
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod interceptor;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::RouterConfig;
pub use error::{Error, ExecuteError, Result, TransportError};
pub use health::HealthObserver;
pub use interceptor::{LoggingInterceptor, Next, RequestInterceptor};
pub use lifecycle::Shutdown;
pub use load_balancer::{LoadBalancer, Outcome, Strategy};
pub use observability::metrics::{CounterKind, MetricsSink, NoopMetrics, RecorderMetrics};
pub use registry::{Server, ServerRegistry, ServerStatus};
pub use transport::{HealthProber, HttpExecutor, HttpProber, HttpQuery, HttpResponse, QueryExecutor};
