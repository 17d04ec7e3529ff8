//! Least Connections load balancing strategy.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::{candidates, LoadBalancer, Outcome};
use crate::registry::Server;

/// Least connections selector.
/// Selects the server with the minimum number of in-flight requests.
#[derive(Debug, Default)]
pub struct LeastConnections {
    in_flight: DashMap<String, usize>,
}

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests currently outstanding against `address`.
    pub fn in_flight(&self, address: &str) -> usize {
        self.in_flight.get(address).map(|c| *c).unwrap_or(0)
    }
}

impl LoadBalancer for LeastConnections {
    fn select(&self, servers: &[Arc<Server>], excluding: &HashSet<String>) -> Option<Arc<Server>> {
        // In case of tie, the first one is selected (stability)
        let chosen = candidates(servers, excluding)
            .min_by_key(|s| self.in_flight(s.address()))?
            .clone();

        *self
            .in_flight
            .entry(chosen.address().to_string())
            .or_insert(0) += 1;
        Some(chosen)
    }

    fn record_completion(&self, server: &Server, _elapsed: Duration, _outcome: Outcome) {
        if let Some(mut count) = self.in_flight.get_mut(server.address()) {
            *count = count.saturating_sub(1);
        }
    }

    fn servers_changed(&self, servers: &[Arc<Server>]) {
        self.in_flight
            .retain(|address, _| servers.iter().any(|s| s.address() == address));
    }

    fn name(&self) -> &'static str {
        "least_connections"
    }
}
