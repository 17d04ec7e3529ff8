//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and health observer produce:
//!     → tracing events (per query span with query id, per probe warnings)
//!     → metrics.rs (latency histogram, error counters by kind)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → any MetricsSink (no-op by default, `metrics` facade, Prometheus)
//! ```

pub mod logging;
pub mod metrics;

use crate::config::ObservabilityConfig;

/// Set up logging and, when configured, the Prometheus exporter.
///
/// Errors are logged rather than returned: observability must never stop the
/// router from starting.
pub fn init(config: &ObservabilityConfig) {
    if let Err(e) = logging::init_logging(&config.log_level) {
        tracing::debug!(error = %e, "Logging already initialized");
    }

    if let Some(address) = &config.metrics_address {
        match address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::install_prometheus_exporter(addr) {
                    tracing::error!(error = %e, "Failed to install Prometheus exporter");
                }
            }
            Err(_) => {
                tracing::error!(metrics_address = %address, "Failed to parse metrics address");
            }
        }
    }
}
