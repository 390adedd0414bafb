//! Transport abstraction for Braid reconciliation
//!
//! The core never touches sockets: it speaks framed messages over a
//! bidirectional byte stream provided by some transport. Production
//! would implement these traits over QUIC or TCP; the test harness uses
//! in-memory duplex channels (`braid-net-sim`).

use braid_model::AuthorId;
use std::fmt;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Accept failed: {0}")]
    Accept(String),
    #[error("Stream error: {0}")]
    Stream(String),
}

/// A bidirectional byte stream (send + receive half).
///
/// Both halves must be independently usable so a session can read and
/// write concurrently.
pub trait BiStream: Send + 'static {
    type SendStream: tokio::io::AsyncWrite + Send + Unpin;
    type RecvStream: tokio::io::AsyncRead + Send + Unpin;

    /// Split into send and receive halves.
    fn into_split(self) -> (Self::SendStream, Self::RecvStream);
}

/// A connection to a remote peer that can open bidirectional streams.
pub trait Connection: Send + Sync + 'static {
    type Stream: BiStream;

    /// Open a new bidirectional stream on this connection.
    fn open_bi(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::Stream, TransportError>> + Send;

    /// The remote peer's author key.
    fn remote_author(&self) -> AuthorId;
}

/// Transport layer abstraction: identity, outbound connections, and
/// inbound connection acceptance.
pub trait Transport: Send + Sync + fmt::Debug + 'static {
    type Connection: Connection;

    /// This peer's author key.
    fn author(&self) -> AuthorId;

    /// Connect to a remote peer by author key.
    fn connect(
        &self,
        peer: &AuthorId,
    ) -> impl std::future::Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// Accept an incoming connection; `None` on shutdown.
    fn accept(&self) -> impl std::future::Future<Output = Option<Self::Connection>> + Send;
}
