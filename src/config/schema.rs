//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::load_balancer::Strategy;
use crate::registry::ServerStatus;
use crate::resilience::backoff::Backoff;

/// Root configuration for the search router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Base addresses of the search servers, in routing order.
    pub servers: Vec<String>,

    /// Load balancing strategy.
    pub load_balancer: Strategy,

    /// Background health probing.
    pub health_check: HealthCheckConfig,

    /// Retry behaviour on transport failures.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable background health probing.
    pub enabled: bool,

    /// Probe interval in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path probed by the HTTP prober.
    pub path: String,

    /// Consecutive successes before a server is marked Enabled.
    pub healthy_threshold: u32,

    /// Consecutive failures before a server is marked with `failure_status`.
    pub unhealthy_threshold: u32,

    /// Status given to servers failing their probes (failed or disabled).
    pub failure_status: ServerStatus,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 5_000,
            timeout_ms: 2_000,
            path: "/admin/ping".to_string(),
            healthy_threshold: 1,
            unhealthy_threshold: 1,
            failure_status: ServerStatus::Failed,
        }
    }
}

impl HealthCheckConfig {
    /// Enabled configuration probing every `interval`, rounded up to whole
    /// milliseconds.
    pub fn every(interval: Duration) -> Self {
        let millis = interval.as_nanos().div_ceil(1_000_000);
        Self {
            enabled: true,
            interval_ms: u64::try_from(millis).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// Copy with zero durations and thresholds raised to 1.
    ///
    /// Configs built in code skip `validate_config`, and the observer loop
    /// cannot run on a zero period.
    pub fn normalized(mut self) -> Self {
        if self.interval_ms == 0 {
            tracing::warn!("health_check.interval_ms is 0, using 1ms");
            self.interval_ms = 1;
        }
        if self.timeout_ms == 0 {
            tracing::warn!("health_check.timeout_ms is 0, using 1ms");
            self.timeout_ms = 1;
        }
        if self.healthy_threshold == 0 || self.unhealthy_threshold == 0 {
            tracing::warn!(
                healthy_threshold = self.healthy_threshold,
                unhealthy_threshold = self.unhealthy_threshold,
                "Zero health check threshold, using 1"
            );
            self.healthy_threshold = self.healthy_threshold.max(1);
            self.unhealthy_threshold = self.unhealthy_threshold.max(1);
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts against other servers after a transport failure.
    pub max_retries: u32,

    /// Base delay before a retry (0 = retry immediately).
    pub base_delay_ms: u64,

    /// Cap on the retry delay.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 0,
            max_delay_ms: 1_000,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single attempt; unset leaves it to the transport.
    pub request_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn request(&self) -> Option<Duration> {
        self.request_ms.map(Duration::from_millis)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus exporter bind address; no exporter when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
