//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every server address parses as a URL
//! - Validate value ranges (intervals > 0, thresholds >= 1, alpha in (0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: RouterConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;
use crate::load_balancer::Strategy;
use crate::registry::ServerStatus;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("no servers configured")]
    NoServers,

    #[error("invalid server address '{address}': {reason}")]
    InvalidServer { address: String, reason: String },

    #[error("health_check.{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health_check.{0} must be at least 1")]
    ZeroThreshold(&'static str),

    #[error("health_check.failure_status must be failed or disabled, got {0}")]
    InvalidFailureStatus(ServerStatus),

    #[error("load_balancer.alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("timeouts.request_ms must be greater than zero")]
    ZeroRequestTimeout,

    #[error("invalid observability.metrics_address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.servers.is_empty() {
        errors.push(ValidationError::NoServers);
    }
    for address in &config.servers {
        if let Err(e) = Url::parse(address) {
            errors.push(ValidationError::InvalidServer {
                address: address.clone(),
                reason: e.to_string(),
            });
        }
    }

    let health = &config.health_check;
    if health.interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("interval_ms"));
    }
    if health.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("timeout_ms"));
    }
    if health.healthy_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold("healthy_threshold"));
    }
    if health.unhealthy_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold("unhealthy_threshold"));
    }
    if !matches!(health.failure_status, ServerStatus::Failed | ServerStatus::Disabled) {
        errors.push(ValidationError::InvalidFailureStatus(health.failure_status));
    }

    if let Strategy::FastestFirst { alpha } = config.load_balancer {
        if !(alpha > 0.0 && alpha <= 1.0) {
            errors.push(ValidationError::InvalidAlpha(alpha));
        }
    }

    if config.timeouts.request_ms == Some(0) {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if let Some(address) = &config.observability.metrics_address {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(address.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
