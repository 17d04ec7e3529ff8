//! Server registry subsystem.
//!
//! # Data Flow
//! ```text
//! configured addresses
//!     → pool.rs (ServerRegistry: ordered, deduplicated entries)
//!     → server.rs (Server: immutable address + atomic status)
//!
//! Readers (load balancer, on every query):
//!     snapshot() → Arc<Vec<Arc<Server>>>, no lock taken
//!
//! Writers:
//!     health observer → set_status(address, status)
//!     configuration   → add / remove / sync
//! ```
//!
//! # Design Decisions
//! - Status is a single atomic byte per entry; readers never see a torn value
//! - Membership changes swap the whole list (copy-on-write), statuses survive the swap
//! - The dispatcher never writes here; outcomes go to the load balancer instead

pub mod pool;
pub mod server;

pub use pool::ServerRegistry;
pub use server::{Server, ServerStatus};
