//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Query arrives
//!     → registry snapshot + servers already tried
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through eligible servers)
//!         - fastest.rs (lowest moving-average latency)
//!         - least_conn.rs (fewest in-flight requests)
//!         - single.rs (one fixed server)
//!     → Selected server, or None
//!
//! Attempt finished
//!     → record_completion(server, elapsed, outcome)
//!     → strategy state (latency averages, in-flight counters)
//!
//! Membership updated
//!     → servers_changed(snapshot)
//!     → state of removed servers dropped
//! ```
//!
//! # Design Decisions
//! - Strategies read status from the registry but never write it
//! - Each strategy owns its private state; all of it is atomic or shard-locked
//! - Enabled and Unknown servers are eligible, Disabled and Failed are not

pub mod fastest;
pub mod least_conn;
pub mod round_robin;
pub mod single;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::registry::Server;

pub use fastest::FastestFirst;
pub use least_conn::LeastConnections;
pub use round_robin::RoundRobin;
pub use single::SingleServer;

/// How an attempt against a server ended, as far as the load balancer cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// A server selection strategy.
pub trait LoadBalancer: Debug + Send + Sync {
    /// Pick one server among the eligible entries of `servers` whose address is
    /// not in `excluding`.
    fn select(&self, servers: &[Arc<Server>], excluding: &HashSet<String>) -> Option<Arc<Server>>;

    /// Report the end of an attempt started by a successful `select`.
    ///
    /// Called exactly once per selection, whatever the outcome.
    fn record_completion(&self, _server: &Server, _elapsed: Duration, _outcome: Outcome) {}

    /// Called after the registry membership changed, with the new snapshot.
    /// Strategies drop per-server state for addresses no longer listed.
    fn servers_changed(&self, _servers: &[Arc<Server>]) {}

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Eligible servers not yet excluded, in registry order.
pub(crate) fn candidates<'a>(
    servers: &'a [Arc<Server>],
    excluding: &'a HashSet<String>,
) -> impl Iterator<Item = &'a Arc<Server>> + 'a {
    servers
        .iter()
        .filter(move |s| s.is_eligible() && !excluding.contains(s.address()))
}

/// Load balancing strategy selection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    RoundRobin,
    FastestFirst {
        /// Weight of the newest latency sample in the moving average.
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    LeastConnections,
    /// Always the first server configured at build time. Later membership
    /// updates do not move it to another address.
    SingleServer,
}

fn default_alpha() -> f64 {
    fastest::DEFAULT_ALPHA
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::RoundRobin
    }
}

impl Strategy {
    /// Instantiate the strategy for the given configured server list.
    pub fn build(&self, servers: &[String]) -> Arc<dyn LoadBalancer> {
        match self {
            Strategy::RoundRobin => Arc::new(RoundRobin::new()),
            Strategy::FastestFirst { alpha } => Arc::new(FastestFirst::with_alpha(*alpha)),
            Strategy::LeastConnections => Arc::new(LeastConnections::new()),
            Strategy::SingleServer => {
                let address = servers.first().cloned().unwrap_or_default();
                if address.is_empty() {
                    tracing::warn!("Single-server strategy configured without a server");
                }
                Arc::new(SingleServer::new(address))
            }
        }
    }
}
