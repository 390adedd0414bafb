//! Peer - the per-author integration engine
//!
//! A peer owns a [`PoLog`], a [`Stash`], the author's keypair, and the
//! current heads. Local writes go through [`Peer::commit`]; remote
//! records go through [`Peer::integrate`], which verifies, routes into
//! log or stash, and re-drains the stash to a fixed point.
//!
//! A peer is a single-threaded cooperative actor: nothing here suspends
//! or locks, and state is mutated by one logical task at a time.

use crate::pol::{LogError, PoLog};
use crate::stash::Stash;
use braid_model::{AuthorId, AuthorIdentity, Id, Record};
use std::collections::HashSet;
use tracing::debug;

pub struct Peer {
    identity: AuthorIdentity,
    heads: Vec<Id>,
    log: PoLog,
    stash: Stash,
    missing_deps: HashSet<Id>,
}

impl Peer {
    /// A peer with an empty log.
    pub fn new(identity: AuthorIdentity) -> Self {
        Self::with_log(identity, PoLog::new())
    }

    /// A peer over an existing log, e.g. one loaded from a snapshot.
    pub fn with_log(identity: AuthorIdentity, log: PoLog) -> Self {
        Self {
            identity,
            heads: log.heads(),
            log,
            stash: Stash::new(),
            missing_deps: HashSet::new(),
        }
    }

    pub fn author(&self) -> AuthorId {
        self.identity.author_id()
    }

    /// The "youngest" records: anchors for the next local commit.
    pub fn heads(&self) -> &[Id] {
        &self.heads
    }

    pub fn log(&self) -> &PoLog {
        &self.log
    }

    /// Create, sign, and admit a record carrying `data`, anchored at the
    /// current heads. The new record becomes the sole head.
    ///
    /// Dependencies always exist locally, so the only expected failures
    /// are cryptographic.
    pub fn commit(&mut self, data: Vec<u8>) -> Result<Record, LogError> {
        let record = Record::create(&self.identity, self.heads.clone(), data);
        self.log.append(record.clone())?;
        self.heads = vec![*record.id()];
        debug!(id = %record.id(), "committed local record");
        Ok(record)
    }

    /// Integrate a batch of records from a remote peer.
    ///
    /// Each record is verified up front; a forged record aborts the whole
    /// batch with prior admissions left in place (the remote is
    /// adversarial). A record whose parents are all admitted goes into
    /// the log; otherwise it is stashed. Whenever a pass admits anything,
    /// heads are recomputed and the stash is re-drained, repeating until
    /// a fixed point.
    pub fn integrate(&mut self, batch: Vec<Record>) -> Result<(), LogError> {
        let mut batch = batch;
        loop {
            let mut changed = false;
            for record in batch {
                record.verify()?;
                if self.log.contains(record.id()) || self.stash.contains(record.id()) {
                    continue;
                }

                let unsatisfied: Vec<Id> = record
                    .deps()
                    .iter()
                    .filter(|dep| !self.log.contains(dep))
                    .copied()
                    .collect();

                if unsatisfied.is_empty() {
                    let id = *record.id();
                    self.log.append(record)?;
                    self.missing_deps.remove(&id);
                    changed = true;
                } else {
                    debug!(
                        id = %record.id(),
                        unsatisfied = unsatisfied.len(),
                        "stashing record with unknown parents"
                    );
                    for dep in unsatisfied {
                        if !self.stash.contains(&dep) {
                            self.missing_deps.insert(dep);
                        }
                    }
                    self.stash.add(record);
                }
            }

            if !changed {
                break;
            }
            self.heads = self.log.heads();
            batch = self.stash.unstash();
            if batch.is_empty() {
                break;
            }
        }
        Ok(())
    }

    /// Heads advertised to remote peers.
    pub fn announce(&self) -> Vec<Id> {
        self.heads.clone()
    }

    /// The subset of `ids` unknown to both log and stash.
    pub fn not_found(&self, ids: &[Id]) -> Vec<Id> {
        ids.iter()
            .filter(|id| !self.log.contains(id) && !self.stash.contains(id))
            .copied()
            .collect()
    }

    /// Records served to a remote peer; unknown ids are silently omitted.
    pub fn request(&self, ids: &[Id]) -> Vec<Record> {
        self.log.get_many(ids)
    }

    /// Snapshot of the ids known to block stashed records.
    pub fn missing_deps(&self) -> Vec<Id> {
        self.missing_deps.iter().copied().collect()
    }

    /// Number of records currently parked in the stash.
    pub fn stashed(&self) -> usize {
        self.stash.len()
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("author", &self.author())
            .field("records", &self.log.len())
            .field("heads", &self.heads.len())
            .field("stashed", &self.stash.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_model::{AuthorIdentity, RecordError, Signature};

    fn test_records(identity: &AuthorIdentity) -> Vec<Record> {
        let a = Record::create(identity, vec![], b"A".to_vec());
        let b = Record::create(identity, vec![*a.id()], b"B".to_vec());
        let c = Record::create(identity, vec![*a.id()], b"C".to_vec());
        let d = Record::create(identity, vec![*b.id()], b"D".to_vec());
        let e = Record::create(identity, vec![*b.id(), *c.id()], b"E".to_vec());
        let f = Record::create(identity, vec![*e.id()], b"F".to_vec());
        vec![a, b, c, d, e, f]
    }

    #[test]
    fn commit_advances_heads() {
        let mut peer = Peer::new(AuthorIdentity::generate());
        assert!(peer.heads().is_empty());

        let first = peer.commit(b"first".to_vec()).unwrap();
        assert!(first.is_genesis());
        assert_eq!(peer.heads(), &[*first.id()]);

        let second = peer.commit(b"second".to_vec()).unwrap();
        assert_eq!(second.deps(), &[*first.id()]);
        assert_eq!(peer.heads(), &[*second.id()]);
    }

    #[test]
    fn commit_merges_concurrent_heads() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);
        let mut peer = Peer::new(AuthorIdentity::generate());
        peer.integrate(records.clone()).unwrap();

        // D and F are concurrent heads; the next commit anchors at both
        let merge = peer.commit(b"merge".to_vec()).unwrap();
        assert_eq!(merge.deps(), &[*records[3].id(), *records[5].id()]);
        assert_eq!(peer.heads(), &[*merge.id()]);
    }

    #[test]
    fn integrate_out_of_order_reaches_canonical_order() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);

        let mut peer = Peer::new(AuthorIdentity::generate());
        let reversed: Vec<_> = records.iter().rev().cloned().collect();
        peer.integrate(reversed).unwrap();

        // all six admitted, parents before children
        assert_eq!(peer.log().len(), 6);
        let labels: Vec<&[u8]> = peer.log().records().iter().map(|r| r.data()).collect();
        assert_eq!(labels, [b"A" as &[u8], b"B", b"C", b"D", b"E", b"F"]);

        assert_eq!(peer.heads(), &[*records[3].id(), *records[5].id()]);
        assert_eq!(peer.stashed(), 0);
        assert!(peer.missing_deps().is_empty());
    }

    #[test]
    fn integrate_is_idempotent() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);

        let mut peer = Peer::new(AuthorIdentity::generate());
        peer.integrate(records.clone()).unwrap();
        let heads = peer.heads().to_vec();

        peer.integrate(records).unwrap();
        assert_eq!(peer.log().len(), 6);
        assert_eq!(peer.heads(), heads);
    }

    #[test]
    fn missing_deps_tracks_unknown_parents_until_admission() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);
        let (a, b, c, e, f) = (
            &records[0],
            &records[1],
            &records[2],
            &records[4],
            &records[5],
        );

        let mut peer = Peer::new(AuthorIdentity::generate());

        peer.integrate(vec![f.clone()]).unwrap();
        assert_eq!(peer.missing_deps(), vec![*e.id()]);
        assert_eq!(peer.stashed(), 1);

        peer.integrate(vec![e.clone()]).unwrap();
        let mut missing = peer.missing_deps();
        missing.sort();
        let mut expected = vec![*e.id(), *b.id(), *c.id()];
        expected.sort();
        // E itself stays listed until admitted; its parents join the set
        assert_eq!(missing, expected);

        peer.integrate(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        assert!(peer.missing_deps().is_empty());
        assert_eq!(peer.log().len(), 6);
        assert_eq!(peer.stashed(), 0);
    }

    #[test]
    fn dep_known_only_to_stash_does_not_error() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);
        let (a, b, d) = (&records[0], &records[1], &records[3]);

        let mut peer = Peer::new(AuthorIdentity::generate());

        // B waits for A; D depends on B which is only stashed - it must
        // be stashed too, never pushed into the log early.
        peer.integrate(vec![b.clone()]).unwrap();
        peer.integrate(vec![d.clone()]).unwrap();
        assert_eq!(peer.stashed(), 2);
        // B is stashed, so only A counts as missing
        assert_eq!(peer.missing_deps(), vec![*a.id()]);

        peer.integrate(vec![a.clone()]).unwrap();
        assert_eq!(peer.log().len(), 3);
        assert!(peer.missing_deps().is_empty());
    }

    #[test]
    fn forged_record_aborts_batch_keeping_prior_admissions() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);
        let (a, b) = (&records[0], &records[1]);

        let forged = Record::from_parts(
            *a.author(),
            Signature([0u8; 64]),
            vec![],
            b"forged".to_vec(),
        );

        let mut peer = Peer::new(AuthorIdentity::generate());
        let result = peer.integrate(vec![a.clone(), forged, b.clone()]);
        match result {
            Err(LogError::Record(RecordError::SignatureInvalid { .. })) => {}
            other => panic!("expected SignatureInvalid, got {:?}", other.map(|_| ())),
        }

        // the batch is partial: A admitted, B never reached
        assert!(peer.log().contains(a.id()));
        assert!(!peer.log().contains(b.id()));
    }

    #[test]
    fn not_found_filters_known_ids() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);
        let (a, f) = (records[0].clone(), records[5].clone());

        let mut peer = Peer::new(AuthorIdentity::generate());
        peer.integrate(vec![a.clone()]).unwrap(); // admitted
        peer.integrate(vec![f.clone()]).unwrap(); // stashed

        let unknown = Id([0x77; 32]);
        assert_eq!(
            peer.not_found(&[*a.id(), *f.id(), unknown]),
            vec![unknown]
        );
    }

    #[test]
    fn request_serves_from_the_log_only() {
        let author = AuthorIdentity::generate();
        let records = test_records(&author);
        let (a, f) = (records[0].clone(), records[5].clone());

        let mut peer = Peer::new(AuthorIdentity::generate());
        peer.integrate(vec![a.clone(), f.clone()]).unwrap(); // F ends up stashed

        let served = peer.request(&[*a.id(), *f.id()]);
        assert_eq!(served, vec![a]);
    }
}
