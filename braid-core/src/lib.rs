//! Braid Core
//!
//! The in-memory heart of a Braid peer:
//! - **PoLog**: append-only partial-order log with id index, child
//!   adjacency, head tracking, and bitmap-backed DAG traversals
//! - **Stash**: holding area for records whose parents are unknown
//! - **Peer**: the integration engine - local commits, batch
//!   integration with stash re-drain, and the reconciliation-facing
//!   operations (announce / not-found / request / missing-deps)
//! - **snapshot**: log persistence via the batch codec

pub mod peer;
pub mod pol;
pub mod snapshot;
pub mod stash;

pub use peer::Peer;
pub use pol::{LogError, PoLog};
pub use snapshot::{read_snapshot, write_snapshot, SnapshotError};
pub use stash::Stash;
