//! Snapshot persistence for the partial-order log
//!
//! A snapshot is the log's records written in insertion order with the
//! batch codec. Because insertion order is a topological sort, replaying
//! the batch through `append` reconstructs an identical log, re-checking
//! every record's hash, signature, and dependency order on the way in.

use crate::pol::{LogError, PoLog};
use braid_model::wire;
use braid_model::WireError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors from snapshot I/O
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not a valid log: {0}")]
    Log(#[from] LogError),
}

/// Write the log to `path`, replacing any existing file.
pub fn write_snapshot(log: &PoLog, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    wire::write_batch(log.records(), &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Load a log previously written by [`write_snapshot`].
///
/// Corrupt bytes surface as [`WireError`]s; a reordered or trimmed batch
/// whose dependencies no longer resolve surfaces as a [`LogError`].
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<PoLog, SnapshotError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let records = wire::read_batch(&mut reader)?;

    let mut log = PoLog::new();
    for record in records {
        log.append(record)?;
    }
    Ok(log)
}
