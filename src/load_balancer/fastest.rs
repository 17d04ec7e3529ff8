//! Fastest-first load balancing strategy.
//!
//! Keeps an exponentially weighted moving average of observed latency per
//! server and routes to the lowest one. Servers without samples estimate at
//! zero, so every new server gets an initial trial.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::{candidates, LoadBalancer, Outcome};
use crate::registry::Server;

/// Weight of the newest sample.
pub const DEFAULT_ALPHA: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
struct LatencyStats {
    /// Moving average in seconds.
    average: f64,
    samples: u64,
}

/// Fastest-first selector.
#[derive(Debug)]
pub struct FastestFirst {
    alpha: f64,
    stats: DashMap<String, LatencyStats>,
}

impl Default for FastestFirst {
    fn default() -> Self {
        Self::with_alpha(DEFAULT_ALPHA)
    }
}

impl FastestFirst {
    pub fn new() -> Self {
        Self::default()
    }

    /// `alpha` is clamped to (0, 1].
    pub fn with_alpha(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() && alpha > 0.0 {
            alpha.min(1.0)
        } else {
            DEFAULT_ALPHA
        };
        Self {
            alpha,
            stats: DashMap::new(),
        }
    }

    /// Current latency estimate for `address` (zero when never observed).
    pub fn estimate(&self, address: &str) -> Duration {
        self.stats
            .get(address)
            .map(|s| Duration::from_secs_f64(s.average))
            .unwrap_or(Duration::ZERO)
    }

    /// Number of completions observed for `address`.
    pub fn samples(&self, address: &str) -> u64 {
        self.stats.get(address).map(|s| s.samples).unwrap_or(0)
    }

    fn average_secs(&self, address: &str) -> f64 {
        self.stats.get(address).map(|s| s.average).unwrap_or(0.0)
    }
}

impl LoadBalancer for FastestFirst {
    fn select(&self, servers: &[Arc<Server>], excluding: &HashSet<String>) -> Option<Arc<Server>> {
        let mut best: Option<(&Arc<Server>, f64)> = None;
        for server in candidates(servers, excluding) {
            let avg = self.average_secs(server.address());
            // Strictly lower wins, so ties keep registry order.
            match best {
                Some((_, best_avg)) if avg >= best_avg => {}
                _ => best = Some((server, avg)),
            }
        }
        best.map(|(s, _)| s.clone())
    }

    fn record_completion(&self, server: &Server, elapsed: Duration, outcome: Outcome) {
        let sample = elapsed.as_secs_f64();
        let alpha = self.alpha;
        self.stats
            .entry(server.address().to_string())
            .and_modify(|s| {
                s.average = alpha * sample + (1.0 - alpha) * s.average;
                s.samples += 1;
            })
            .or_insert(LatencyStats {
                average: sample,
                samples: 1,
            });
        tracing::trace!(
            address = %server.address(),
            elapsed_ms = elapsed.as_millis() as u64,
            ?outcome,
            "Latency sample recorded"
        );
    }

    fn servers_changed(&self, servers: &[Arc<Server>]) {
        self.stats
            .retain(|address, _| servers.iter().any(|s| s.address() == address));
    }

    fn name(&self) -> &'static str {
        "fastest_first"
    }
}
