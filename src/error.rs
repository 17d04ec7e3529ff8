//! Error taxonomy for query dispatch.
//!
//! Three layers:
//! - [`TransportError`]: the server could not be reached or did not answer in time
//! - [`ExecuteError`]: what an executor, prober or interceptor hands back for one attempt
//! - [`Error`]: the single terminal failure a query surfaces to its caller

use std::time::Duration;
use thiserror::Error;

use crate::observability::metrics::CounterKind;

/// Network-level failure against one specific server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The connection broke while sending or receiving.
    #[error("I/O error: {0}")]
    Io(String),

    /// No answer within the deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered, but only to say it cannot serve right now.
    #[error("server unavailable (status {0})")]
    Unavailable(u16),
}

/// Outcome of a single failed attempt (one server, one request).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecuteError {
    /// Reaching the server failed. Another replica may succeed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server rejected the query itself.
    #[error("remote error: {0}")]
    Remote(String),

    /// Decoding or transforming the response failed.
    #[error("transform error: {0}")]
    Transform(String),

    /// Anything else.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl ExecuteError {
    /// Only transport failures say something about the server rather than the query.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecuteError::Transport(_))
    }

    /// The metrics counter this failure is accounted under.
    pub fn counter_kind(&self) -> CounterKind {
        match self {
            ExecuteError::Transport(_) => CounterKind::Io,
            ExecuteError::Remote(_) => CounterKind::Remote,
            ExecuteError::Transform(_) => CounterKind::Transform,
            ExecuteError::Other(_) => CounterKind::Other,
        }
    }

    /// Attach the server the attempt ran against, producing the caller-facing error.
    pub fn into_query_error(self, server: &str) -> Error {
        match self {
            ExecuteError::Transport(source) => Error::Transport {
                server: server.to_string(),
                source,
            },
            ExecuteError::Remote(message) => Error::Remote {
                server: server.to_string(),
                message,
            },
            ExecuteError::Transform(msg) => Error::Transform(msg),
            ExecuteError::Other(msg) => Error::Other(msg),
        }
    }
}

/// Terminal failure of a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// No eligible server at selection time.
    #[error("no servers available")]
    NoServersAvailable,

    /// The last attempted server could not be reached and the retry budget is spent.
    #[error("transport error against {server}: {source}")]
    Transport {
        server: String,
        #[source]
        source: TransportError,
    },

    /// The server rejected the query.
    #[error("remote error from {server}: {message}")]
    Remote { server: String, message: String },

    /// The response transformation failed.
    #[error("response transform failed: {0}")]
    Transform(String),

    /// Uncategorized failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

/// Result type for query operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
