//! PoLog - the append-only partial-order log
//!
//! Insertion order is a topological sort of the causal DAG: `append`
//! refuses any record whose parents are not already admitted, and
//! content addressing makes fabricating a cycle equivalent to finding a
//! SHA-256 collision. Records are never removed, mutated, or re-ordered.

use braid_model::{Bitmap, Id, Record, RecordError};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Errors from raw log operations
#[derive(Error, Debug)]
pub enum LogError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("record has already been committed: {0}")]
    AlreadyCommitted(Id),

    #[error("parent record not found: {0}")]
    DependencyNotFound(Id),
}

/// Append-only log of records, indexed by id and by child adjacency.
///
/// Three structures are kept strictly consistent:
/// - `records`: the log itself, in insertion order
/// - `index`: id → insertion index
/// - `children_of`: for each index, the indices of records that list it
///   as a dependency
#[derive(Debug, Default)]
pub struct PoLog {
    records: Vec<Record>,
    index: HashMap<Id, usize>,
    children_of: Vec<Vec<usize>>,
}

impl PoLog {
    /// A new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of admitted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Admit a record at the end of the log.
    ///
    /// The record must verify, must not already be present, and every
    /// dependency must already be admitted - parents always precede
    /// children in insertion order.
    pub fn append(&mut self, record: Record) -> Result<(), LogError> {
        record.verify()?;
        if self.index.contains_key(record.id()) {
            return Err(LogError::AlreadyCommitted(*record.id()));
        }
        for dep in record.deps() {
            if !self.index.contains_key(dep) {
                return Err(LogError::DependencyNotFound(*dep));
            }
        }

        let i = self.records.len();
        self.index.insert(*record.id(), i);
        self.children_of.push(Vec::new());
        for dep in record.deps() {
            let parent = self.index[dep];
            self.children_of[parent].push(i);
        }
        self.records.push(record);
        Ok(())
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a record by id.
    pub fn get(&self, id: &Id) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Look up many records; unknown ids are silently omitted.
    pub fn get_many(&self, ids: &[Id]) -> Vec<Record> {
        ids.iter().filter_map(|id| self.get(id).cloned()).collect()
    }

    /// Page through the latest records: skip `skip` from the tail, then
    /// return up to `take` records in insertion order. Returns an empty
    /// slice when `skip` alone exhausts the log.
    pub fn latest_n(&self, skip: usize, take: usize) -> &[Record] {
        let end = self.records.len().saturating_sub(skip);
        let start = end.saturating_sub(take);
        &self.records[start..end]
    }

    /// Ids of all records with no admitted children, in insertion order.
    /// These are the anchors for newly created records.
    pub fn heads(&self) -> Vec<Id> {
        self.children_of
            .iter()
            .enumerate()
            .filter(|(_, children)| children.is_empty())
            .map(|(i, _)| *self.records[i].id())
            .collect()
    }

    /// Resolve known ids to insertion indices, dropping unknown ones.
    fn indexes(&self, ids: &[Id]) -> Vec<usize> {
        ids.iter().filter_map(|id| self.index.get(id).copied()).collect()
    }

    /// Breadth-first walk over `heads` and everything reachable through
    /// `deps` edges, each record visited exactly once. Returns the
    /// visited bitmap.
    fn walk<'a>(&'a self, heads: &[Id], mut f: impl FnMut(usize, &'a Record)) -> Bitmap {
        let mut queue: VecDeque<usize> = self.indexes(heads).into();
        let mut visited = Bitmap::new(self.records.len());
        while let Some(i) = queue.pop_front() {
            if visited.get(i) {
                continue;
            }
            visited.set(i, true);
            let record = &self.records[i];
            queue.extend(self.indexes(record.deps()));
            f(i, record);
        }
        visited
    }

    /// All records reachable from `heads` through dependency edges,
    /// including the heads themselves, in BFS dequeue order. Unknown ids
    /// are ignored.
    pub fn predecessors(&self, heads: &[Id]) -> Vec<&Record> {
        let mut result = Vec::new();
        self.walk(heads, |_, record| result.push(record));
        result
    }

    /// The complement of [`predecessors`](Self::predecessors): records
    /// that are successors of, or concurrent to, `heads` - in insertion
    /// order. With no heads, the entire log.
    pub fn missing(&self, heads: &[Id]) -> Vec<&Record> {
        let visited = self.walk(heads, |_, _| {});
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| !visited.get(*i))
            .map(|(_, record)| record)
            .collect()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// All admitted ids, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.records.iter().map(Record::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_model::AuthorIdentity;

    /*
              / B - D
            A
              \ C - E - F
               (E also depends on B)
    */
    fn test_records(identity: &AuthorIdentity) -> Vec<Record> {
        let a = Record::create(identity, vec![], b"A".to_vec());
        let b = Record::create(identity, vec![*a.id()], b"B".to_vec());
        let c = Record::create(identity, vec![*a.id()], b"C".to_vec());
        let d = Record::create(identity, vec![*b.id()], b"D".to_vec());
        let e = Record::create(identity, vec![*b.id(), *c.id()], b"E".to_vec());
        let f = Record::create(identity, vec![*e.id()], b"F".to_vec());
        vec![a, b, c, d, e, f]
    }

    fn full_log(records: &[Record]) -> PoLog {
        let mut log = PoLog::new();
        for record in records {
            log.append(record.clone()).unwrap();
        }
        log
    }

    #[test]
    fn append_then_get() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);

        assert_eq!(log.len(), 6);
        for record in &records {
            assert!(log.contains(record.id()));
            assert_eq!(log.get(record.id()), Some(record));
        }
        assert_eq!(log.get(&Id([0u8; 32])), None);
    }

    #[test]
    fn append_rejects_duplicates() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let mut log = full_log(&records);

        match log.append(records[0].clone()) {
            Err(LogError::AlreadyCommitted(id)) => assert_eq!(&id, records[0].id()),
            other => panic!("expected AlreadyCommitted, got {:?}", other.map(|_| ())),
        }
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn append_rejects_missing_middle_dependency() {
        let identity = AuthorIdentity::generate();
        let mut records = test_records(&identity);
        let e = records.remove(4); // drop E; F depends on it

        let mut log = PoLog::new();
        for (i, record) in records.iter().enumerate() {
            let result = log.append(record.clone());
            if i == 4 {
                // F is now at position 4
                match result {
                    Err(LogError::DependencyNotFound(id)) => assert_eq!(&id, e.id()),
                    other => panic!("expected DependencyNotFound, got {:?}", other.map(|_| ())),
                }
            } else {
                result.unwrap();
            }
        }
        assert_eq!(log.len(), 4); // A, B, C, D
    }

    #[test]
    fn append_rejects_self_dependency() {
        let identity = AuthorIdentity::generate();
        let mut log = PoLog::new();

        // A record can reference its own id only by knowing it up front,
        // which content addressing prevents; a self-referencing dep is
        // simply an unknown parent.
        let a = Record::create(&identity, vec![], b"A".to_vec());
        let orphan = Record::create(&identity, vec![*a.id()], b"orphan".to_vec());
        match log.append(orphan) {
            Err(LogError::DependencyNotFound(id)) => assert_eq!(&id, a.id()),
            other => panic!("expected DependencyNotFound, got {:?}", other.map(|_| ())),
        }
        assert!(log.is_empty());
    }

    #[test]
    fn get_many_omits_unknown_ids() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);

        let wanted = [*records[1].id(), Id([0xee; 32]), *records[3].id()];
        let found = log.get_many(&wanted);
        assert_eq!(found, vec![records[1].clone(), records[3].clone()]);
    }

    #[test]
    fn pagination() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);

        // first page, shifted by one from the tail
        assert_eq!(log.latest_n(1, 2), &records[3..5]);
        // second page, shifted by three
        assert_eq!(log.latest_n(3, 3), &records[0..3]);
    }

    #[test]
    fn pagination_boundaries() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);
        let n = log.len();

        assert!(log.latest_n(0, 0).is_empty());
        assert!(log.latest_n(n, 0).is_empty());
        assert!(log.latest_n(n + 10, 3).is_empty());
        assert_eq!(log.latest_n(0, n), &records[..]);
        // skip + take overruns: the remaining prefix comes back short
        assert_eq!(log.latest_n(4, 100), &records[0..2]);
    }

    #[test]
    fn heads_track_the_frontier() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let mut log = PoLog::new();

        log.append(records[0].clone()).unwrap();
        assert_eq!(log.heads(), vec![*records[0].id()]);

        for record in &records[1..] {
            log.append(record.clone()).unwrap();
        }
        // D and F have no children, in insertion order
        assert_eq!(log.heads(), vec![*records[3].id(), *records[5].id()]);
    }

    #[test]
    fn predecessors_walks_breadth_first() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);
        let (b, c, e) = (&records[1], &records[2], &records[4]);

        let preds = log.predecessors(&[*e.id()]);
        let labels: Vec<&[u8]> = preds.iter().map(|r| r.data()).collect();
        assert_eq!(labels, [b"E" as &[u8], b"B", b"C", b"A"]);

        // shared ancestor A is emitted exactly once
        let preds = log.predecessors(&[*b.id(), *c.id()]);
        let labels: Vec<&[u8]> = preds.iter().map(|r| r.data()).collect();
        assert_eq!(labels, [b"B" as &[u8], b"C", b"A"]);
    }

    #[test]
    fn predecessors_of_nothing_is_empty() {
        let identity = AuthorIdentity::generate();
        let log = full_log(&test_records(&identity));

        assert!(log.predecessors(&[]).is_empty());
        // unknown heads are ignored
        assert!(log.predecessors(&[Id([0x99; 32])]).is_empty());
    }

    #[test]
    fn missing_is_the_traversal_complement() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);
        let (b, c, e) = (&records[1], &records[2], &records[4]);

        let missing = log.missing(&[*e.id()]);
        let labels: Vec<&[u8]> = missing.iter().map(|r| r.data()).collect();
        assert_eq!(labels, [b"D" as &[u8], b"F"]);

        let missing = log.missing(&[*b.id(), *c.id()]);
        let labels: Vec<&[u8]> = missing.iter().map(|r| r.data()).collect();
        assert_eq!(labels, [b"D" as &[u8], b"E", b"F"]);
    }

    #[test]
    fn missing_of_nothing_is_the_whole_log() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);

        let missing = log.missing(&[]);
        assert_eq!(missing.len(), records.len());
        for (got, want) in missing.iter().zip(&records) {
            assert_eq!(got.id(), want.id());
        }
    }

    #[test]
    fn insertion_indices_respect_causality() {
        let identity = AuthorIdentity::generate();
        let records = test_records(&identity);
        let log = full_log(&records);

        for record in log.records() {
            let child = log.index[record.id()];
            for dep in record.deps() {
                assert!(log.index[dep] < child, "parent must precede child");
            }
        }
    }
}
