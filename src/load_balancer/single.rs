//! Single-server strategy.

use std::collections::HashSet;
use std::sync::Arc;

use crate::load_balancer::LoadBalancer;
use crate::registry::Server;

/// Always routes to one configured server.
#[derive(Debug, Clone)]
pub struct SingleServer {
    address: String,
}

impl SingleServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl LoadBalancer for SingleServer {
    fn select(&self, servers: &[Arc<Server>], excluding: &HashSet<String>) -> Option<Arc<Server>> {
        if excluding.contains(&self.address) {
            return None;
        }
        servers
            .iter()
            .find(|s| s.address() == self.address)
            .filter(|s| s.is_eligible())
            .cloned()
    }

    fn servers_changed(&self, servers: &[Arc<Server>]) {
        if !servers.iter().any(|s| s.address() == self.address) {
            tracing::warn!(
                address = %self.address,
                "Single server left the registry; queries will find no server"
            );
        }
    }

    fn name(&self) -> &'static str {
        "single_server"
    }
}
