//! Server registry.
//!
//! # Responsibilities
//! - Keep the ordered list of known servers (order drives round-robin fairness)
//! - Hand out consistent point-in-time snapshots without blocking writers
//! - Apply status updates by address, atomically per entry

use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::registry::server::{Server, ServerStatus};

/// A point-in-time view of the registry.
pub type Snapshot = Arc<Vec<Arc<Server>>>;

/// Ordered, thread-safe set of servers.
#[derive(Debug)]
pub struct ServerRegistry {
    servers: ArcSwap<Vec<Arc<Server>>>,
}

impl ServerRegistry {
    /// Create a registry from addresses. Duplicates keep their first position.
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let servers = addresses
            .into_iter()
            .map(Into::<String>::into)
            .filter(|address| seen.insert(address.clone()))
            .map(|address| Arc::new(Server::new(address)))
            .collect::<Vec<_>>();

        Self {
            servers: ArcSwap::from_pointee(servers),
        }
    }

    /// Current servers in registry order.
    pub fn snapshot(&self) -> Snapshot {
        self.servers.load_full()
    }

    /// Look up a server by address.
    pub fn get(&self, address: &str) -> Option<Arc<Server>> {
        self.servers
            .load()
            .iter()
            .find(|s| s.address() == address)
            .cloned()
    }

    /// Current status of `address`, if known.
    pub fn status(&self, address: &str) -> Option<ServerStatus> {
        self.get(address).map(|s| s.status())
    }

    /// Set the status of `address`.
    ///
    /// Returns `false` (and changes nothing) when the address is not registered:
    /// probes and membership are updated independently, so this is expected.
    pub fn set_status(&self, address: &str, status: ServerStatus) -> bool {
        match self.get(address) {
            Some(server) => {
                let previous = server.set_status(status);
                if previous != status {
                    tracing::debug!(address = %address, from = %previous, to = %status, "Server status changed");
                }
                true
            }
            None => {
                tracing::debug!(address = %address, status = %status, "Ignoring status update for unknown server");
                false
            }
        }
    }

    /// Append a server. Returns `false` if it was already present.
    pub fn add(&self, address: impl Into<String>) -> bool {
        let address = address.into();
        let mut added = false;
        self.servers.rcu(|current| {
            let mut next = current.as_ref().clone();
            added = !next.iter().any(|s| s.address() == address);
            if added {
                next.push(Arc::new(Server::new(address.clone())));
            }
            next
        });
        added
    }

    /// Remove a server. Returns `false` if it was not present.
    pub fn remove(&self, address: &str) -> bool {
        let mut removed = false;
        self.servers.rcu(|current| {
            let mut next = current.as_ref().clone();
            let before = next.len();
            next.retain(|s| s.address() != address);
            removed = next.len() != before;
            next
        });
        removed
    }

    /// Replace the membership with `addresses`, in that order.
    ///
    /// Servers present before and after keep their entry (and status); new ones
    /// start as `Unknown`. Returns `true` if membership or order changed.
    pub fn sync<I, S>(&self, addresses: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let wanted: Vec<String> = addresses
            .into_iter()
            .map(Into::<String>::into)
            .filter(|address| seen.insert(address.clone()))
            .collect();

        let mut changed = false;
        self.servers.rcu(|current| {
            let next: Vec<Arc<Server>> = wanted
                .iter()
                .map(|address| {
                    current
                        .iter()
                        .find(|s| s.address() == address)
                        .cloned()
                        .unwrap_or_else(|| Arc::new(Server::new(address.clone())))
                })
                .collect();
            changed = next.len() != current.len()
                || next
                    .iter()
                    .zip(current.iter())
                    .any(|(a, b)| !Arc::ptr_eq(a, b));
            next
        });

        if changed {
            tracing::info!(servers = ?wanted, "Server list updated");
        }
        changed
    }

    /// All registered addresses in order.
    pub fn addresses(&self) -> Vec<String> {
        self.servers
            .load()
            .iter()
            .map(|s| s.address().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.servers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.load().is_empty()
    }
}
