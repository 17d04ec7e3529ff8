//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the sink the dispatcher reports into (latency, error counters)
//! - Provide a no-op default and a `metrics`-facade implementation
//! - Optionally expose a Prometheus scrape endpoint
//!
//! # Metrics
//! - `search_router_request_duration_seconds` (histogram): successful query latency
//! - `search_router_errors_total` (counter): failed attempts by `kind` (io, remote, transform, other)
//!
//! # Design Decisions
//! - Sinks are observers only; they cannot influence control flow
//! - A misbehaving sink (panicking) is isolated from the query it reports on

use std::fmt::Debug;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

/// Error counter categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// Transport failures (connection, I/O, timeout).
    Io,
    /// The server rejected the query.
    Remote,
    /// The response transformation failed.
    Transform,
    Other,
}

impl CounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Io => "io",
            CounterKind::Remote => "remote",
            CounterKind::Transform => "transform",
            CounterKind::Other => "other",
        }
    }
}

/// Receiver of dispatcher measurements.
pub trait MetricsSink: Debug + Send + Sync {
    fn record_latency(&self, elapsed: Duration);
    fn increment_counter(&self, kind: CounterKind);
}

/// Discards everything. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_latency(&self, _elapsed: Duration) {}
    fn increment_counter(&self, _kind: CounterKind) {}
}

/// Forwards to whatever recorder is installed for the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderMetrics;

impl MetricsSink for RecorderMetrics {
    fn record_latency(&self, elapsed: Duration) {
        metrics::histogram!("search_router_request_duration_seconds").record(elapsed.as_secs_f64());
    }

    fn increment_counter(&self, kind: CounterKind) {
        metrics::counter!("search_router_errors_total", "kind" => kind.as_str()).increment(1);
    }
}

/// Calls into a sink with panics contained.
pub(crate) fn guarded<F: FnOnce()>(what: &'static str, f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(call = what, "Metrics sink panicked; measurement dropped");
    }
}

/// Install the Prometheus exporter as the global `metrics` recorder,
/// serving scrapes on `addr`. Must run inside a Tokio runtime.
pub fn install_prometheus_exporter(
    addr: SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}
