//! Stash - holding area for records whose parents are not yet known
//!
//! Records arrive out of order because the transport makes no causal
//! guarantees. A record missing a parent is parked here, already
//! verified, until integration re-drains the stash.

use braid_model::{Id, Record};
use std::collections::HashMap;

/// Insertion-ordered bag of records awaiting their parents.
///
/// Holds the guarantee that no stashed record's id is also present in
/// the log: the integration engine checks the log before stashing.
#[derive(Debug, Default)]
pub struct Stash {
    log: Vec<Record>,
    index: HashMap<Id, usize>,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a record. Adding the same id twice is a no-op.
    pub fn add(&mut self, record: Record) {
        if self.index.contains_key(record.id()) {
            return;
        }
        self.index.insert(*record.id(), self.log.len());
        self.log.push(record);
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Take everything out, newest first, leaving the stash empty.
    ///
    /// The reversal is a heuristic: records stashed later tend to have
    /// their parents stashed earlier, so draining tail-first satisfies
    /// more dependencies in a single pass.
    pub fn unstash(&mut self) -> Vec<Record> {
        self.index.clear();
        let mut drained = std::mem::take(&mut self.log);
        drained.reverse();
        drained
    }
}
