//! Round-robin load balancing strategy.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{candidates, LoadBalancer};
use crate::registry::Server;

/// Round-robin selector.
/// Stores an internal cursor to rotate through eligible servers.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn select(&self, servers: &[Arc<Server>], excluding: &HashSet<String>) -> Option<Arc<Server>> {
        let eligible: Vec<&Arc<Server>> = candidates(servers, excluding).collect();
        if eligible.is_empty() {
            return None;
        }

        // Advances once per successful selection; wraps on overflow.
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % eligible.len();
        Some(eligible[idx].clone())
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
