//! Braid Sync
//!
//! The anti-entropy layer between Braid peers:
//! - **Message**: the three tagged wire messages (announce / request /
//!   records)
//! - **MessageSink / MessageStream**: length-delimited framing over any
//!   async byte stream
//! - **Transport / Connection / BiStream**: the seam a real network
//!   implementation plugs into
//! - **reconcile**: the head-exchange pull, in process and over a
//!   transport stream

pub mod framing;
pub mod message;
pub mod reconcile;
pub mod transport;

pub use framing::{MessageSink, MessageStream};
pub use message::{Message, MessageError};
pub use reconcile::{pull, pull_over, serve, SyncError};
pub use transport::{BiStream, Connection, Transport, TransportError};
