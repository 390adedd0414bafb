//! In-memory network simulation for Braid
//!
//! `ChannelTransport` implements the `braid-sync` transport traits over
//! `tokio::io::DuplexStream`, with a shared `ChannelNetwork` broker for
//! peer discovery. Enables multi-peer reconciliation tests without real
//! networking.

use braid_model::AuthorId;
use braid_sync::{BiStream, Connection, Transport, TransportError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, Mutex};

const DUPLEX_BUF_SIZE: usize = 64 * 1024;

/// Shared broker routing connections between `ChannelTransport` instances.
#[derive(Clone, Debug, Default)]
pub struct ChannelNetwork {
    peers: Arc<Mutex<HashMap<AuthorId, mpsc::Sender<ChannelConnection>>>>,
}

impl ChannelNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, author: AuthorId, accept_tx: mpsc::Sender<ChannelConnection>) {
        self.peers.lock().await.insert(author, accept_tx);
    }
}

/// In-memory `Transport` implementation.
#[derive(Debug)]
pub struct ChannelTransport {
    author: AuthorId,
    network: ChannelNetwork,
    accept_rx: Mutex<mpsc::Receiver<ChannelConnection>>,
}

impl ChannelTransport {
    /// Create a transport for `author` and register it on the network.
    pub async fn new(author: AuthorId, network: &ChannelNetwork) -> Self {
        let (accept_tx, accept_rx) = mpsc::channel(64);
        network.register(author, accept_tx).await;
        Self {
            author,
            network: network.clone(),
            accept_rx: Mutex::new(accept_rx),
        }
    }
}

impl Transport for ChannelTransport {
    type Connection = ChannelConnection;

    fn author(&self) -> AuthorId {
        self.author
    }

    async fn connect(&self, peer: &AuthorId) -> Result<ChannelConnection, TransportError> {
        let accept_tx = {
            let peers = self.network.peers.lock().await;
            peers
                .get(peer)
                .ok_or_else(|| TransportError::Connect(format!("peer {} not on network", peer)))?
                .clone()
        };

        // The initiator mints duplex pairs on open_bi and hands one end
        // to the responder through this channel.
        let (stream_tx, stream_rx) = mpsc::channel::<DuplexStream>(8);

        let responder = ChannelConnection {
            remote: self.author,
            role: Role::Responder(Arc::new(Mutex::new(stream_rx))),
        };
        accept_tx.send(responder).await.map_err(|_| {
            TransportError::Connect(format!("peer {} stopped accepting", peer))
        })?;

        Ok(ChannelConnection {
            remote: *peer,
            role: Role::Initiator(Arc::new(Mutex::new(stream_tx))),
        })
    }

    async fn accept(&self) -> Option<ChannelConnection> {
        self.accept_rx.lock().await.recv().await
    }
}

enum Role {
    /// Creates duplex pairs and sends one end to the peer.
    Initiator(Arc<Mutex<mpsc::Sender<DuplexStream>>>),
    /// Receives duplex ends from the initiator.
    Responder(Arc<Mutex<mpsc::Receiver<DuplexStream>>>),
}

impl Clone for Role {
    fn clone(&self) -> Self {
        match self {
            Role::Initiator(tx) => Role::Initiator(tx.clone()),
            Role::Responder(rx) => Role::Responder(rx.clone()),
        }
    }
}

/// In-memory connection between two `ChannelTransport` instances.
pub struct ChannelConnection {
    remote: AuthorId,
    role: Role,
}

impl std::fmt::Debug for ChannelConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConnection")
            .field("remote", &self.remote)
            .finish()
    }
}

impl Connection for ChannelConnection {
    type Stream = ChannelBiStream;

    async fn open_bi(&self) -> Result<ChannelBiStream, TransportError> {
        match self.role.clone() {
            Role::Initiator(tx) => {
                let (mine, theirs) = tokio::io::duplex(DUPLEX_BUF_SIZE);
                let tx = tx.lock().await;
                tx.send(theirs)
                    .await
                    .map_err(|_| TransportError::Stream("connection closed".into()))?;
                Ok(ChannelBiStream(mine))
            }
            Role::Responder(rx) => {
                let mut rx = rx.lock().await;
                let stream = rx
                    .recv()
                    .await
                    .ok_or_else(|| TransportError::Stream("connection closed".into()))?;
                Ok(ChannelBiStream(stream))
            }
        }
    }

    fn remote_author(&self) -> AuthorId {
        self.remote
    }
}

/// One end of an in-memory bidirectional stream: writes on one end are
/// reads on the other.
pub struct ChannelBiStream(DuplexStream);

impl BiStream for ChannelBiStream {
    type SendStream = WriteHalf<DuplexStream>;
    type RecvStream = ReadHalf<DuplexStream>;

    fn into_split(self) -> (Self::SendStream, Self::RecvStream) {
        let (read, write) = tokio::io::split(self.0);
        (write, read)
    }
}
