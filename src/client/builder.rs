//! Client construction.

use std::sync::Arc;
use std::time::Duration;

use crate::client::dispatcher::{Dispatcher, Interceptors};
use crate::client::{Client, Inner};
use crate::config::{HealthCheckConfig, RouterConfig};
use crate::health::HealthObserver;
use crate::interceptor::RequestInterceptor;
use crate::lifecycle::BackgroundTask;
use crate::load_balancer::{LoadBalancer, Strategy};
use crate::observability::metrics::{MetricsSink, NoopMetrics};
use crate::registry::ServerRegistry;
use crate::resilience::backoff::Backoff;
use crate::transport::{HealthProber, HttpExecutor, HttpProber, QueryExecutor};

/// Builder for [`Client`].
///
/// Defaults: round-robin, one retry, no backoff, no request deadline, no
/// health observation, no-op metrics.
pub struct ClientBuilder<E: QueryExecutor> {
    executor: E,
    servers: Vec<String>,
    strategy: Strategy,
    load_balancer: Option<Arc<dyn LoadBalancer>>,
    max_retries: u32,
    backoff: Backoff,
    request_timeout: Option<Duration>,
    health: Option<(Arc<dyn HealthProber>, HealthCheckConfig)>,
    interceptors: Interceptors<E>,
    metrics: Arc<dyn MetricsSink>,
}

impl ClientBuilder<HttpExecutor> {
    /// Start from the bundled HTTP executor.
    pub fn http() -> Self {
        Self::new(HttpExecutor::new())
    }
}

impl<E: QueryExecutor> ClientBuilder<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            servers: Vec::new(),
            strategy: Strategy::default(),
            load_balancer: None,
            max_retries: 1,
            backoff: Backoff::NONE,
            request_timeout: None,
            health: None,
            interceptors: Vec::new(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replace the server list.
    pub fn servers<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Route to a single server.
    pub fn server(mut self, address: impl Into<String>) -> Self {
        self.servers = vec![address.into()];
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self.load_balancer = None;
        self
    }

    /// Use a custom load balancer instead of a built-in strategy.
    pub fn load_balancer(mut self, load_balancer: Arc<dyn LoadBalancer>) -> Self {
        self.load_balancer = Some(load_balancer);
        self
    }

    /// Additional attempts after transport failures (default 1).
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Deadline for each attempt; expiry counts as a transport failure.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Probe servers in the background. Nothing is spawned unless `config.enabled`.
    pub fn health_check<P: HealthProber>(mut self, prober: P, config: HealthCheckConfig) -> Self {
        let prober: Arc<dyn HealthProber> = Arc::new(prober);
        self.health = Some((prober, config));
        self
    }

    /// Append an interceptor. The first one added is the outermost.
    pub fn interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: RequestInterceptor<E::Query, E::Response> + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn metrics<M: MetricsSink + 'static>(mut self, metrics: M) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Apply a loaded configuration. Enabled health checks probe over HTTP on
    /// `health_check.path`; call [`health_check`](Self::health_check) afterwards
    /// to use another prober.
    pub fn from_config(mut self, config: &RouterConfig) -> Self {
        self.servers = config.servers.clone();
        self.strategy = config.load_balancer.clone();
        self.load_balancer = None;
        self.max_retries = config.retries.max_retries;
        self.backoff = config.retries.backoff();
        self.request_timeout = config.timeouts.request();
        self.health = config.health_check.enabled.then(|| {
            let prober: Arc<dyn HealthProber> = Arc::new(HttpProber::new(&config.health_check.path));
            (prober, config.health_check.clone())
        });
        self
    }

    /// Build the client. Spawns the health observer when enabled, so this must
    /// run inside a Tokio runtime in that case.
    pub fn build(self) -> Client<E> {
        let registry = Arc::new(ServerRegistry::new(self.servers.iter().cloned()));
        let load_balancer = self
            .load_balancer
            .unwrap_or_else(|| self.strategy.build(&self.servers));

        let health = match self.health {
            Some((prober, config)) if config.enabled => {
                let observer = HealthObserver::new(registry.clone(), prober, config);
                Some(BackgroundTask::spawn("health-observer", move |rx| observer.run(rx)))
            }
            _ => None,
        };

        tracing::info!(
            servers = registry.len(),
            strategy = load_balancer.name(),
            max_retries = self.max_retries,
            health_check = health.is_some(),
            interceptors = self.interceptors.len(),
            "Search router client built"
        );

        Client {
            inner: Arc::new(Inner {
                dispatcher: Dispatcher {
                    registry,
                    load_balancer,
                    executor: self.executor,
                    interceptors: self.interceptors,
                    metrics: self.metrics,
                    max_retries: self.max_retries,
                    backoff: self.backoff,
                    request_timeout: self.request_timeout,
                },
                health,
            }),
        }
    }
}
