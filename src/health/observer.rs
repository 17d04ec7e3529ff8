//! Background health observation.
//!
//! # Responsibilities
//! - Periodically probe every server in the registry
//! - Update server status based on probe streaks

use dashmap::DashMap;
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::error::ExecuteError;
use crate::registry::{Server, ServerRegistry, ServerStatus};
use crate::resilience::timeouts::with_timeout;
use crate::transport::HealthProber;

#[derive(Debug, Default, Clone, Copy)]
struct Streak {
    successes: u32,
    failures: u32,
}

pub struct HealthObserver {
    registry: Arc<ServerRegistry>,
    prober: Arc<dyn HealthProber>,
    config: HealthCheckConfig,
    streaks: DashMap<String, Streak>,
}

impl HealthObserver {
    pub fn new(
        registry: Arc<ServerRegistry>,
        prober: Arc<dyn HealthProber>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            registry,
            prober,
            config: config.normalized(),
            streaks: DashMap::new(),
        }
    }

    /// Probe on every interval tick until `shutdown` fires.
    ///
    /// The first cycle starts immediately. A cycle in flight when shutdown
    /// fires is abandoned, so no probe is issued after the signal.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.config.interval_ms,
            timeout_ms = self.config.timeout_ms,
            servers = self.registry.len(),
            "Health observer starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = self.check_all() => {}
            }
        }

        tracing::info!("Health observer received shutdown signal, exiting loop");
    }

    /// Run one probe cycle over the current registry snapshot.
    pub async fn check_all(&self) {
        let servers = self.registry.snapshot();
        self.streaks
            .retain(|address, _| servers.iter().any(|s| s.address() == address));

        join_all(servers.iter().map(|server| self.check(server))).await;
    }

    async fn check(&self, server: &Server) {
        let probe = AssertUnwindSafe(self.prober.probe(server))
            .catch_unwind()
            .map(|result| {
                result.unwrap_or_else(|_| Err(ExecuteError::Other("health prober panicked".into())))
            });

        match with_timeout(Some(self.config.timeout()), probe).await {
            Ok(()) => {
                if self.record(server.address(), true) >= self.config.healthy_threshold {
                    self.transition(server, ServerStatus::Enabled);
                }
            }
            Err(e) => {
                tracing::warn!(server = %server.address(), error = %e, "Health probe failed");
                if self.record(server.address(), false) >= self.config.unhealthy_threshold {
                    self.transition(server, self.config.failure_status);
                }
            }
        }
    }

    /// Extend the streak for `address`, returning its new length.
    fn record(&self, address: &str, healthy: bool) -> u32 {
        let mut streak = self.streaks.entry(address.to_string()).or_default();
        if healthy {
            streak.failures = 0;
            streak.successes = streak.successes.saturating_add(1);
            streak.successes
        } else {
            streak.successes = 0;
            streak.failures = streak.failures.saturating_add(1);
            streak.failures
        }
    }

    fn transition(&self, server: &Server, status: ServerStatus) {
        let previous = server.set_status(status);
        if previous != status {
            tracing::info!(
                server = %server.address(),
                from = %previous,
                to = %status,
                "Server status changed"
            );
        }
    }
}
