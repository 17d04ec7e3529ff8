//! A single search server.
//!
//! # Responsibilities
//! - Carry the immutable endpoint address
//! - Hold the current status (Unknown/Enabled/Disabled/Failed)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Server status enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Not probed yet.
    Unknown = 0,
    Enabled = 1,
    Disabled = 2,
    Failed = 3,
}

impl From<u8> for ServerStatus {
    fn from(val: u8) -> Self {
        match val {
            1 => ServerStatus::Enabled,
            2 => ServerStatus::Disabled,
            3 => ServerStatus::Failed,
            _ => ServerStatus::Unknown,
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerStatus::Unknown => "unknown",
            ServerStatus::Enabled => "enabled",
            ServerStatus::Disabled => "disabled",
            ServerStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A single search server.
#[derive(Debug)]
pub struct Server {
    /// Endpoint address (base URL), the server's identity.
    address: String,
    /// Current status, stored as a `ServerStatus` discriminant.
    status: AtomicU8,
}

impl Server {
    /// Create a server in `Unknown` status.
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_status(address, ServerStatus::Unknown)
    }

    pub fn with_status(address: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            address: address.into(),
            status: AtomicU8::new(status as u8),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn status(&self) -> ServerStatus {
        ServerStatus::from(self.status.load(Ordering::Acquire))
    }

    /// Store a new status, returning the previous one.
    pub(crate) fn set_status(&self, status: ServerStatus) -> ServerStatus {
        ServerStatus::from(self.status.swap(status as u8, Ordering::AcqRel))
    }

    /// Return true if the server may receive traffic (Enabled or Unknown).
    pub fn is_eligible(&self) -> bool {
        matches!(self.status(), ServerStatus::Enabled | ServerStatus::Unknown)
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_server_is_unknown_and_eligible() {
        let server = Server::new("http://localhost:8983/solr");
        assert_eq!(server.address(), "http://localhost:8983/solr");
        assert_eq!(server.status(), ServerStatus::Unknown);
        assert!(server.is_eligible());
    }

    #[test]
    fn test_eligibility_by_status() {
        let server = Server::new("http://a");
        assert_eq!(server.set_status(ServerStatus::Enabled), ServerStatus::Unknown);
        assert!(server.is_eligible());
        server.set_status(ServerStatus::Disabled);
        assert!(!server.is_eligible());
        server.set_status(ServerStatus::Failed);
        assert!(!server.is_eligible());
    }

    #[test]
    fn test_status_from_u8() {
        for status in [
            ServerStatus::Unknown,
            ServerStatus::Enabled,
            ServerStatus::Disabled,
            ServerStatus::Failed,
        ] {
            assert_eq!(ServerStatus::from(status as u8), status);
        }
        assert_eq!(ServerStatus::from(42), ServerStatus::Unknown);
    }
}
