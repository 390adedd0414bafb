//! Message framing over async byte streams
//!
//! Length-delimited frames (tokio-util `LengthDelimitedCodec`) carrying
//! encoded [`Message`]s, over any `AsyncWrite`/`AsyncRead`. Decoupled
//! from any concrete transport.

use crate::message::{Message, MessageError};
use crate::SyncError;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// Framed writer for sending messages over an AsyncWrite stream.
pub struct MessageSink<W: AsyncWrite + Send + Unpin> {
    inner: FramedWrite<W, LengthDelimitedCodec>,
}

impl<W: AsyncWrite + Send + Unpin> MessageSink<W> {
    pub fn new(stream: W) -> Self {
        Self {
            inner: FramedWrite::new(stream, LengthDelimitedCodec::new()),
        }
    }

    /// Send one length-prefixed message.
    pub async fn send(&mut self, msg: &Message) -> Result<(), SyncError> {
        let bytes = msg.encode_to_vec()?;
        self.inner
            .send(bytes.into())
            .await
            .map_err(SyncError::Io)
    }

    /// Consume the sink and return the underlying writer, for
    /// transport-specific finalization.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

/// Framed reader for receiving messages from an AsyncRead stream.
pub struct MessageStream<R: AsyncRead + Send + Unpin> {
    inner: FramedRead<R, LengthDelimitedCodec>,
}

impl<R: AsyncRead + Send + Unpin> MessageStream<R> {
    pub fn new(stream: R) -> Self {
        Self {
            inner: FramedRead::new(stream, LengthDelimitedCodec::new()),
        }
    }

    /// Receive the next message, or `None` when the stream is closed.
    pub async fn recv(&mut self) -> Result<Option<Message>, SyncError> {
        match self.inner.next().await {
            Some(Ok(bytes)) => Message::decode_from_slice(&bytes)
                .map(Some)
                .map_err(MessageError::into),
            Some(Err(e)) => Err(SyncError::Io(e)),
            None => Ok(None),
        }
    }
}
