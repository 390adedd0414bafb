//! Anti-entropy reconciliation
//!
//! A one-directional pull equalizes `dst` with `src`:
//!
//! ```text
//! heads   ← src.announce()
//! missing ← dst.not_found(heads)
//! while missing ≠ ∅:
//!     records ← src.request(missing)
//!     dst.integrate(records)
//!     missing ← dst.missing_deps()
//! ```
//!
//! Each round either admits records whose parents are now known or
//! surfaces deeper missing ancestors from freshly stashed records, so
//! `missing` strictly shrinks toward ∅ whenever `src` can still teach
//! anything. Full anti-entropy runs the pull in both directions.
//!
//! [`pull`] is the in-process form; [`serve`]/[`pull_over`] speak the
//! same protocol over a framed transport stream.

use crate::framing::{MessageSink, MessageStream};
use crate::message::{Message, MessageError};
use crate::transport::{BiStream, TransportError};
use braid_core::{LogError, Peer};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors surfaced by reconciliation sessions.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream closed mid-exchange")]
    StreamClosed,

    #[error("unexpected {0} message")]
    UnexpectedMessage(&'static str),
}

/// Pull everything `src` knows into `dst`, in process.
///
/// Errors out on forged records; prior admissions persist. A `src` that
/// cannot serve any requested id ends the exchange early.
pub fn pull(dst: &mut Peer, src: &Peer) -> Result<(), LogError> {
    let heads = src.announce();
    let mut missing = dst.not_found(&heads);
    while !missing.is_empty() {
        let records = src.request(&missing);
        if records.is_empty() {
            break;
        }
        dst.integrate(records)?;
        missing = dst.missing_deps();
    }
    Ok(())
}

/// Answer one reconciliation pull from the remote side of `stream`.
///
/// Sends an `Announce` with the current heads, then serves `Request`s
/// until the remote closes the stream.
pub async fn serve<S: BiStream>(peer: &Mutex<Peer>, stream: S) -> Result<(), SyncError> {
    let (send, recv) = stream.into_split();
    let mut sink = MessageSink::new(send);
    let mut messages = MessageStream::new(recv);

    let heads = peer.lock().await.announce();
    debug!(heads = heads.len(), "announcing heads");
    sink.send(&Message::Announce(heads)).await?;

    while let Some(msg) = messages.recv().await? {
        match msg {
            Message::Request(ids) => {
                let records = peer.lock().await.request(&ids);
                debug!(requested = ids.len(), served = records.len(), "serving records");
                sink.send(&Message::Records(records)).await?;
            }
            other => return Err(SyncError::UnexpectedMessage(other.kind())),
        }
    }
    Ok(())
}

/// Drive one reconciliation pull against the serving side of `stream`.
///
/// Consumes the remote's `Announce`, then requests missing records until
/// the missing-deps set drains; closing the stream tells the remote the
/// exchange is over.
pub async fn pull_over<S: BiStream>(peer: &Mutex<Peer>, stream: S) -> Result<(), SyncError> {
    let (send, recv) = stream.into_split();
    let mut sink = MessageSink::new(send);
    let mut messages = MessageStream::new(recv);

    let heads = match messages.recv().await? {
        Some(Message::Announce(heads)) => heads,
        Some(other) => return Err(SyncError::UnexpectedMessage(other.kind())),
        None => return Err(SyncError::StreamClosed),
    };

    let mut missing = peer.lock().await.not_found(&heads);
    while !missing.is_empty() {
        sink.send(&Message::Request(missing.clone())).await?;
        let records = match messages.recv().await? {
            Some(Message::Records(records)) => records,
            Some(other) => return Err(SyncError::UnexpectedMessage(other.kind())),
            None => return Err(SyncError::StreamClosed),
        };
        if records.is_empty() {
            break;
        }

        let mut guard = peer.lock().await;
        guard.integrate(records)?;
        missing = guard.missing_deps();
        debug!(missing = missing.len(), "reconciliation round complete");
    }
    Ok(())
}
