//! HTTP executor and prober.
//!
//! # Responsibilities
//! - Issue `GET {server}/{path}?{params}` for queries and health probes
//! - Classify failures for the dispatcher's retry decision
//!
//! # Design Decisions
//! - Connection errors, timeouts and 502/503/504 are transport failures (retried)
//! - Any other non-2xx status is a remote failure (the query was rejected)
//! - Response bodies are returned as text; decoding is the caller's transform

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::{ExecuteError, TransportError};
use crate::registry::Server;
use crate::transport::{HealthProber, QueryExecutor};

/// A query sent as a GET request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpQuery {
    /// Path relative to the server's base address, e.g. `select`.
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl HttpQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Build the URL for `path` under the server's base address.
fn endpoint(server: &Server, path: &str) -> Result<Url, ExecuteError> {
    let base = server.address().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{}/{}", base, path)).map_err(|e| {
        ExecuteError::Other(format!("invalid URL for {}: {}", server.address(), e))
    })
}

fn classify_error(err: reqwest::Error, timeout: Option<Duration>) -> ExecuteError {
    if err.is_timeout() {
        TransportError::Timeout(timeout.unwrap_or_default()).into()
    } else if err.is_connect() {
        TransportError::ConnectionRefused(err.to_string()).into()
    } else {
        TransportError::Io(err.to_string()).into()
    }
}

fn classify_status(status: u16, body: String) -> Result<HttpResponse, ExecuteError> {
    match status {
        200..=299 => Ok(HttpResponse { status, body }),
        502..=504 => Err(TransportError::Unavailable(status).into()),
        _ => Err(ExecuteError::Remote(format!("status {}: {}", status, body.trim()))),
    }
}

/// Query executor over plain HTTP GET.
#[derive(Debug, Clone, Default)]
pub struct HttpExecutor {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured reqwest client (pooling, TLS, proxies).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Per-request timeout enforced by the HTTP client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn get(&self, server: &Server, query: &HttpQuery) -> Result<HttpResponse, ExecuteError> {
        let mut url = endpoint(server, &query.path)?;
        if !query.params.is_empty() {
            url.query_pairs_mut().extend_pairs(query.params.iter());
        }

        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(e, self.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(e, self.timeout))?;

        classify_status(status, body)
    }
}

impl QueryExecutor for HttpExecutor {
    type Query = HttpQuery;
    type Response = HttpResponse;

    fn execute<'a>(
        &'a self,
        server: &'a Server,
        query: &'a HttpQuery,
    ) -> BoxFuture<'a, Result<HttpResponse, ExecuteError>> {
        self.get(server, query).boxed()
    }
}

/// Health prober issuing `GET {server}/{path}`; any 2xx is healthy.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    path: String,
}

impl HttpProber {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            path: path.into(),
        }
    }

    pub fn with_client(client: Client, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl HealthProber for HttpProber {
    fn probe<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, Result<(), ExecuteError>> {
        async move {
            let url = endpoint(server, &self.path)?;
            let response = self
                .client
                .get(url)
                .header("user-agent", "search-router-health-check")
                .send()
                .await
                .map_err(|e| classify_error(e, None))?;

            let status = response.status().as_u16();
            if (200..300).contains(&status) {
                Ok(())
            } else {
                let body = response.text().await.unwrap_or_default();
                classify_status(status, body).map(|_| ())
            }
        }
        .boxed()
    }
}
