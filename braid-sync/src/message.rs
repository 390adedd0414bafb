//! Reconciliation wire messages
//!
//! Three message kinds drive the anti-entropy exchange, each prefixed
//! with a one-byte tag:
//!
//! - `0x00 Announce` - tag ∥ id list (the sender's heads)
//! - `0x01 Request`  - tag ∥ id list (ids the sender wants)
//! - `0x02 Records`  - tag ∥ record batch
//!
//! Bodies use the record codec from `braid_model::wire`; outer framing
//! (length delimiting) is the transport's concern.

use braid_model::{wire, Id, Record, WireError};
use std::io::{Read, Write};
use thiserror::Error;

const TAG_ANNOUNCE: u8 = 0x00;
const TAG_REQUEST: u8 = 0x01;
const TAG_RECORDS: u8 = 0x02;

/// Errors from message encoding/decoding
#[derive(Error, Debug)]
pub enum MessageError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("unknown message tag: {0:#04x}")]
    UnknownTag(u8),
}

/// One reconciliation message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The sender's current heads.
    Announce(Vec<Id>),
    /// Ids the sender wants records for.
    Request(Vec<Id>),
    /// Records answering a request.
    Records(Vec<Record>),
}

impl Message {
    /// Human-readable kind, for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Announce(_) => "announce",
            Message::Request(_) => "request",
            Message::Records(_) => "records",
        }
    }

    /// Write the tagged message body.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), MessageError> {
        match self {
            Message::Announce(ids) => {
                w.write_all(&[TAG_ANNOUNCE]).map_err(WireError::from)?;
                wire::write_ids(ids, w)?;
            }
            Message::Request(ids) => {
                w.write_all(&[TAG_REQUEST]).map_err(WireError::from)?;
                wire::write_ids(ids, w)?;
            }
            Message::Records(records) => {
                w.write_all(&[TAG_RECORDS]).map_err(WireError::from)?;
                wire::write_batch(records, w)?;
            }
        }
        Ok(())
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8>, MessageError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Read one tagged message. Records inside a `Records` body are
    /// verified by the codec before they reach the caller.
    pub fn decode<R: Read>(r: &mut R) -> Result<Self, MessageError> {
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag).map_err(WireError::from)?;
        match tag[0] {
            TAG_ANNOUNCE => Ok(Message::Announce(wire::read_ids(r)?)),
            TAG_REQUEST => Ok(Message::Request(wire::read_ids(r)?)),
            TAG_RECORDS => Ok(Message::Records(wire::read_batch(r)?)),
            other => Err(MessageError::UnknownTag(other)),
        }
    }

    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        Self::decode(&mut &bytes[..])
    }
}
