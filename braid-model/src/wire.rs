//! Bit-exact wire codec for records and record batches
//!
//! Layout of a record:
//!
//! ```text
//! author (32 B) ∥ signature (64 B) ∥ deps_len (uvarint) ∥ dep… (32 B each)
//!   ∥ payload_len (uvarint) ∥ payload
//! ```
//!
//! A batch is `count (uvarint)` followed by that many records. The record
//! id is never transmitted: the reader re-derives it from the content and
//! verifies the result, so a forged body cannot survive deserialization.
//!
//! Uvarints are base-128 little-endian, 7 data bits per byte, continuation
//! bit in the MSB. Length prefixes are checked against hard limits before
//! any allocation happens.

use crate::record::{Record, RecordError};
use crate::types::{AuthorId, Id, Signature};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Maximum accepted payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Maximum accepted number of dependencies per record.
pub const MAX_DEPS: usize = 65_536;

/// A uvarint never needs more than 10 bytes for a u64.
const MAX_UVARINT_BYTES: usize = 10;

/// Errors produced while encoding or decoding wire data
#[derive(Error, Debug)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("uvarint exceeds 64 bits")]
    VarintTooLong,

    #[error("payload of {0} bytes exceeds limit of {MAX_PAYLOAD_SIZE}")]
    PayloadTooLarge(usize),

    #[error("{0} dependencies exceed limit of {MAX_DEPS}")]
    TooManyDeps(usize),

    #[error(transparent)]
    Record(#[from] RecordError),
}

fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), WireError> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WireError::UnexpectedEof
        } else {
            WireError::Io(e)
        }
    })
}

/// Write a canonical uvarint.
pub fn write_uvarint<W: Write>(mut value: u64, w: &mut W) -> Result<(), WireError> {
    let mut buf = [0u8; MAX_UVARINT_BYTES];
    let mut n = 0;
    while value >= 0x80 {
        buf[n] = value as u8 | 0x80;
        value >>= 7;
        n += 1;
    }
    buf[n] = value as u8;
    w.write_all(&buf[..=n])?;
    Ok(())
}

/// Read a uvarint, rejecting encodings longer than a u64 can hold.
pub fn read_uvarint<R: Read>(r: &mut R) -> Result<u64, WireError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    for _ in 0..MAX_UVARINT_BYTES {
        let mut byte = [0u8; 1];
        fill(r, &mut byte)?;
        let b = byte[0];
        if shift == 63 && b > 1 {
            return Err(WireError::VarintTooLong);
        }
        value |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(WireError::VarintTooLong)
}

/// Write an id list: uvarint count, then each 32-byte id.
pub fn write_ids<W: Write>(ids: &[Id], w: &mut W) -> Result<(), WireError> {
    write_uvarint(ids.len() as u64, w)?;
    for id in ids {
        w.write_all(id.as_bytes())?;
    }
    Ok(())
}

/// Read an id list written by [`write_ids`].
pub fn read_ids<R: Read>(r: &mut R) -> Result<Vec<Id>, WireError> {
    let count = read_uvarint(r)? as usize;
    if count > MAX_DEPS {
        return Err(WireError::TooManyDeps(count));
    }
    let mut ids = Vec::with_capacity(count);
    let mut buf = [0u8; Id::LEN];
    for _ in 0..count {
        fill(r, &mut buf)?;
        ids.push(Id(buf));
    }
    Ok(ids)
}

/// Serialize a record. The id is omitted; readers re-derive it.
pub fn write_record<W: Write>(record: &Record, w: &mut W) -> Result<(), WireError> {
    if record.deps().len() > MAX_DEPS {
        return Err(WireError::TooManyDeps(record.deps().len()));
    }
    if record.data().len() > MAX_PAYLOAD_SIZE {
        return Err(WireError::PayloadTooLarge(record.data().len()));
    }
    w.write_all(record.author().as_bytes())?;
    w.write_all(record.signature().as_bytes())?;
    write_ids(record.deps(), w)?;
    write_uvarint(record.data().len() as u64, w)?;
    w.write_all(record.data())?;
    Ok(())
}

/// Deserialize and verify one record.
///
/// Fails on short reads, oversized length prefixes, and any record whose
/// recomputed id or signature does not check out.
pub fn read_record<R: Read>(r: &mut R) -> Result<Record, WireError> {
    let mut author = [0u8; AuthorId::LEN];
    fill(r, &mut author)?;
    let mut signature = [0u8; Signature::LEN];
    fill(r, &mut signature)?;
    let deps = read_ids(r)?;

    let payload_len = read_uvarint(r)? as usize;
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(WireError::PayloadTooLarge(payload_len));
    }
    let mut data = vec![0u8; payload_len];
    fill(r, &mut data)?;

    let record = Record::from_parts(AuthorId(author), Signature(signature), deps, data);
    record.verify()?;
    Ok(record)
}

/// Serialize a batch: uvarint count, then each record.
pub fn write_batch<W: Write>(records: &[Record], w: &mut W) -> Result<(), WireError> {
    write_uvarint(records.len() as u64, w)?;
    for record in records {
        write_record(record, w)?;
    }
    Ok(())
}

/// Deserialize a batch written by [`write_batch`].
pub fn read_batch<R: Read>(r: &mut R) -> Result<Vec<Record>, WireError> {
    let count = read_uvarint(r)? as usize;
    // The count is attacker-controlled; cap the upfront allocation and let
    // a short stream fail on read instead.
    let mut records = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        records.push(read_record(r)?);
    }
    Ok(records)
}
