//! The per-query state machine.
//!
//! ```text
//! select(snapshot, excluded)
//!     None → NoServersAvailable (or the last transport error after a retry)
//!     Some(server) → execute through the interceptor chain
//!         Ok                → record success, return
//!         Transport failure → record failure, exclude server, retry if budget left
//!         anything else     → record failure, return
//! ```

use futures_util::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::client::attempt::RequestAttempt;
use crate::error::{Error, ExecuteError, Result};
use crate::interceptor::{Next, RequestInterceptor};
use crate::load_balancer::{LoadBalancer, Outcome};
use crate::observability::metrics::{guarded, CounterKind, MetricsSink};
use crate::registry::{Server, ServerRegistry};
use crate::resilience::backoff::Backoff;
use crate::resilience::retries::{classify, Disposition};
use crate::resilience::timeouts::with_timeout;
use crate::transport::QueryExecutor;

pub(crate) type Interceptors<E> = Vec<
    Arc<dyn RequestInterceptor<<E as QueryExecutor>::Query, <E as QueryExecutor>::Response>>,
>;

pub(crate) struct Dispatcher<E: QueryExecutor> {
    pub(crate) registry: Arc<ServerRegistry>,
    pub(crate) load_balancer: Arc<dyn LoadBalancer>,
    pub(crate) executor: E,
    pub(crate) interceptors: Interceptors<E>,
    pub(crate) metrics: Arc<dyn MetricsSink>,
    pub(crate) max_retries: u32,
    pub(crate) backoff: Backoff,
    pub(crate) request_timeout: Option<Duration>,
}

impl<E: QueryExecutor> Dispatcher<E> {
    /// Route `request` and apply `transform` to the successful response.
    pub(crate) async fn dispatch<T, X, F>(&self, request: &E::Query, transform: F) -> Result<T>
    where
        F: FnOnce(E::Response) -> std::result::Result<T, X>,
        X: Display,
    {
        let mut attempt = RequestAttempt::new(self.max_retries);
        let span = tracing::debug_span!("query", query_id = %attempt.query_id());

        async move {
            let response = self.route(&mut attempt, request).await?;

            match catch_unwind(AssertUnwindSafe(|| transform(response))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(self.fail_transform(e.to_string())),
                Err(panic) => Err(self.fail_transform(panic_message(panic.as_ref()))),
            }
        }
        .instrument(span)
        .await
    }

    async fn route(&self, attempt: &mut RequestAttempt, request: &E::Query) -> Result<E::Response> {
        let mut last_error = None;

        loop {
            let servers = self.registry.snapshot();
            let Some(server) = self.load_balancer.select(&servers, attempt.excluded()) else {
                return Err(last_error.unwrap_or_else(|| {
                    tracing::warn!(
                        tried = attempt.tried().len(),
                        strategy = self.load_balancer.name(),
                        "No eligible server"
                    );
                    Error::NoServersAvailable
                }));
            };
            drop(servers);

            attempt.record_try(server.address());
            let started = Instant::now();
            let result = self.execute(&server, request).await;
            let elapsed = started.elapsed();

            let error = match result {
                Ok(response) => {
                    self.load_balancer
                        .record_completion(&server, elapsed, Outcome::Success);
                    let total = attempt.elapsed();
                    guarded("record_latency", || self.metrics.record_latency(total));
                    tracing::debug!(
                        server = %server.address(),
                        attempts = attempt.tried().len(),
                        elapsed_ms = total.as_millis() as u64,
                        "Query succeeded"
                    );
                    return Ok(response);
                }
                Err(error) => error,
            };

            self.load_balancer
                .record_completion(&server, elapsed, Outcome::Failure);
            let kind = error.counter_kind();
            guarded("increment_counter", || self.metrics.increment_counter(kind));

            match classify(&error) {
                Disposition::Fail => {
                    tracing::debug!(server = %server.address(), error = %error, "Query failed");
                    return Err(error.into_query_error(server.address()));
                }
                Disposition::RetryElsewhere => {
                    let retry = attempt.fail_over(server.address());
                    tracing::warn!(
                        server = %server.address(),
                        error = %error,
                        retries_left = attempt.retries_left(),
                        "Transport failure"
                    );
                    let terminal = error.into_query_error(server.address());
                    if !retry {
                        return Err(terminal);
                    }
                    last_error = Some(terminal);

                    let delay = self.backoff.delay(attempt.retries_used());
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// One attempt: interceptors, executor, optional deadline. Panics become `Other`.
    async fn execute(
        &self,
        server: &Server,
        request: &E::Query,
    ) -> std::result::Result<E::Response, ExecuteError> {
        let call = Next::new(&self.interceptors, &self.executor).run(server, request);
        let call = AssertUnwindSafe(call).catch_unwind().map(|result| {
            result.unwrap_or_else(|panic| Err(ExecuteError::Other(panic_message(panic.as_ref()))))
        });
        with_timeout(self.request_timeout, call).await
    }

    fn fail_transform(&self, message: String) -> Error {
        tracing::debug!(error = %message, "Response transform failed");
        guarded("increment_counter", || {
            self.metrics.increment_counter(CounterKind::Transform)
        });
        Error::Transform(message)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::load_balancer::{LeastConnections, RoundRobin, SingleServer};
    use crate::registry::ServerStatus;
    use futures_util::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Behavior {
        Answer,
        Refuse,
        Reject,
        Panic,
    }

    /// Answers per address; unscripted addresses answer normally.
    #[derive(Default)]
    struct Scripted {
        behaviors: HashMap<String, Behavior>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn with(pairs: &[(&str, Behavior)]) -> Self {
            Self {
                behaviors: pairs.iter().map(|(a, b)| (a.to_string(), *b)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl QueryExecutor for Scripted {
        type Query = String;
        type Response = String;

        fn execute<'a>(
            &'a self,
            server: &'a Server,
            query: &'a String,
        ) -> BoxFuture<'a, std::result::Result<String, ExecuteError>> {
            async move {
                self.calls.lock().unwrap().push(server.address().to_string());
                match self.behaviors.get(server.address()).copied().unwrap_or(Behavior::Answer) {
                    Behavior::Answer => Ok(format!("{} from {}", query, server.address())),
                    Behavior::Refuse => {
                        Err(TransportError::ConnectionRefused(server.address().into()).into())
                    }
                    Behavior::Reject => Err(ExecuteError::Remote("undefined field".into())),
                    Behavior::Panic => panic!("executor bug"),
                }
            }
            .boxed()
        }
    }

    #[derive(Debug, Default)]
    struct Counting {
        latencies: AtomicUsize,
        counters: Mutex<Vec<CounterKind>>,
    }

    impl MetricsSink for Counting {
        fn record_latency(&self, _elapsed: Duration) {
            self.latencies.fetch_add(1, Ordering::SeqCst);
        }
        fn increment_counter(&self, kind: CounterKind) {
            self.counters.lock().unwrap().push(kind);
        }
    }

    #[derive(Debug)]
    struct Exploding;

    impl MetricsSink for Exploding {
        fn record_latency(&self, _elapsed: Duration) {
            panic!("sink down");
        }
        fn increment_counter(&self, _kind: CounterKind) {
            panic!("sink down");
        }
    }

    fn dispatcher(
        executor: Arc<Scripted>,
        addresses: &[&str],
        max_retries: u32,
        metrics: Arc<dyn MetricsSink>,
    ) -> Dispatcher<Arc<Scripted>> {
        Dispatcher {
            registry: Arc::new(ServerRegistry::new(addresses.iter().copied())),
            load_balancer: Arc::new(RoundRobin::new()),
            executor,
            interceptors: Vec::new(),
            metrics,
            max_retries,
            backoff: Backoff::NONE,
            request_timeout: None,
        }
    }

    async fn query(d: &Dispatcher<Arc<Scripted>>) -> Result<String> {
        d.dispatch(&"q".to_string(), Ok::<_, String>).await
    }

    #[tokio::test]
    async fn test_transport_failure_retries_on_other_server() {
        let exec = Arc::new(Scripted::with(&[("http://a", Behavior::Refuse)]));
        let metrics = Arc::new(Counting::default());
        let d = dispatcher(exec.clone(), &["http://a", "http://b"], 1, metrics.clone());

        assert_eq!(query(&d).await, Ok("q from http://b".to_string()));
        assert_eq!(exec.calls(), ["http://a", "http://b"]);
        assert_eq!(*metrics.counters.lock().unwrap(), [CounterKind::Io]);
        assert_eq!(metrics.latencies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_error_is_not_retried() {
        let exec = Arc::new(Scripted::with(&[("http://a", Behavior::Reject)]));
        let metrics = Arc::new(Counting::default());
        let d = dispatcher(exec.clone(), &["http://a", "http://b"], 3, metrics.clone());

        assert_eq!(
            query(&d).await,
            Err(Error::Remote {
                server: "http://a".into(),
                message: "undefined field".into()
            })
        );
        assert_eq!(exec.calls(), ["http://a"]);
        assert_eq!(*metrics.counters.lock().unwrap(), [CounterKind::Remote]);
    }

    #[tokio::test]
    async fn test_budget_exhausted_surfaces_last_error() {
        let exec = Arc::new(Scripted::with(&[
            ("http://a", Behavior::Refuse),
            ("http://b", Behavior::Refuse),
            ("http://c", Behavior::Refuse),
        ]));
        let d = dispatcher(exec.clone(), &["http://a", "http://b", "http://c"], 1, Arc::new(Counting::default()));

        let err = query(&d).await.unwrap_err();
        assert!(matches!(err, Error::Transport { ref server, .. } if server == "http://b"));
        assert_eq!(exec.calls(), ["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn test_candidates_exhausted_surfaces_last_error() {
        let exec = Arc::new(Scripted::with(&[("http://a", Behavior::Refuse)]));
        let d = dispatcher(exec.clone(), &["http://a"], 5, Arc::new(Counting::default()));

        let err = query(&d).await.unwrap_err();
        assert!(matches!(err, Error::Transport { ref server, .. } if server == "http://a"));
        assert_eq!(exec.calls(), ["http://a"]);
    }

    #[tokio::test]
    async fn test_no_servers_available() {
        let exec = Arc::new(Scripted::default());
        let d = dispatcher(exec.clone(), &["http://a"], 1, Arc::new(Counting::default()));
        d.registry.set_status("http://a", ServerStatus::Disabled);

        assert_eq!(query(&d).await, Err(Error::NoServersAvailable));
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transform_failure() {
        let exec = Arc::new(Scripted::default());
        let metrics = Arc::new(Counting::default());
        let d = dispatcher(exec.clone(), &["http://a", "http://b"], 1, metrics.clone());

        let result: Result<u32> = d
            .dispatch(&"q".to_string(), |body: String| body.parse::<u32>())
            .await;
        assert!(matches!(result, Err(Error::Transform(_))));
        assert_eq!(exec.calls().len(), 1);
        assert_eq!(*metrics.counters.lock().unwrap(), [CounterKind::Transform]);
    }

    #[tokio::test]
    async fn test_panicking_transform_is_a_transform_error() {
        let d = dispatcher(Arc::new(Scripted::default()), &["http://a"], 1, Arc::new(Counting::default()));

        let result: Result<()> = d
            .dispatch(&"q".to_string(), |_body: String| -> std::result::Result<(), String> {
                panic!("bad decoder")
            })
            .await;
        assert_eq!(result, Err(Error::Transform("panicked: bad decoder".into())));
    }

    #[tokio::test]
    async fn test_executor_panic_is_other() {
        let exec = Arc::new(Scripted::with(&[("http://a", Behavior::Panic)]));
        let metrics = Arc::new(Counting::default());
        let d = dispatcher(exec.clone(), &["http://a", "http://b"], 1, metrics.clone());

        assert_eq!(
            query(&d).await,
            Err(Error::Other("panicked: executor bug".into()))
        );
        assert_eq!(exec.calls(), ["http://a"]);
        assert_eq!(*metrics.counters.lock().unwrap(), [CounterKind::Other]);
    }

    #[tokio::test]
    async fn test_panicking_metrics_sink_does_not_change_outcome() {
        let exec = Arc::new(Scripted::with(&[("http://a", Behavior::Refuse)]));
        let d = dispatcher(exec, &["http://a", "http://b"], 1, Arc::new(Exploding));

        assert_eq!(query(&d).await, Ok("q from http://b".to_string()));
    }

    #[tokio::test]
    async fn test_every_selection_is_completed() {
        let exec = Arc::new(Scripted::with(&[
            ("http://a", Behavior::Refuse),
            ("http://c", Behavior::Reject),
        ]));
        let lb = Arc::new(LeastConnections::new());
        let mut d = dispatcher(exec, &["http://a", "http://b", "http://c"], 1, Arc::new(Counting::default()));
        d.load_balancer = lb.clone();

        for _ in 0..5 {
            let _ = query(&d).await;
        }
        d.registry.set_status("http://b", ServerStatus::Failed);
        for _ in 0..5 {
            let _ = query(&d).await;
        }

        assert_eq!(lb.in_flight("http://a"), 0);
        assert_eq!(lb.in_flight("http://b"), 0);
        assert_eq!(lb.in_flight("http://c"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_is_a_transport_failure() {
        struct Hanging;

        impl QueryExecutor for Hanging {
            type Query = ();
            type Response = ();

            fn execute<'a>(
                &'a self,
                server: &'a Server,
                _query: &'a (),
            ) -> BoxFuture<'a, std::result::Result<(), ExecuteError>> {
                async move {
                    if server.address() == "http://slow" {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                    Ok(())
                }
                .boxed()
            }
        }

        let d = Dispatcher {
            registry: Arc::new(ServerRegistry::new(["http://slow"])),
            load_balancer: Arc::new(SingleServer::new("http://slow")),
            executor: Hanging,
            interceptors: Vec::new(),
            metrics: Arc::new(Counting::default()),
            max_retries: 0,
            backoff: Backoff::NONE,
            request_timeout: Some(Duration::from_millis(200)),
        };

        let result = d.dispatch(&(), Ok::<_, String>).await;
        assert_eq!(
            result,
            Err(Error::Transport {
                server: "http://slow".into(),
                source: TransportError::Timeout(Duration::from_millis(200)),
            })
        );
    }
}
