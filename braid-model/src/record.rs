//! Records: signed, content-addressed causal units
//!
//! A record is immutable once built. Its id is the SHA-256 of the
//! canonical body (deps ∥ data ∥ author), so any mutation changes the id
//! and any peer can recompute and check it.

use crate::crypto;
use crate::identity::AuthorIdentity;
use crate::types::{AuthorId, Id, Signature};
use thiserror::Error;

/// Record validation error. Both variants are fatal for the offending
/// record: it must be dropped, never admitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record hash and id don't match: {id}")]
    HashMismatch { id: Id },

    #[error("record signature verification failed: {id}")]
    SignatureInvalid { id: Id },
}

/// A signed, content-addressed unit of causal history.
///
/// `deps` lists the ids of the record's direct causal predecessors; order
/// is preserved because it is part of the hash input. An empty `deps` is
/// only meaningful for genesis records.
///
/// Note: the signature covers `data` only, not the id. An attacker who
/// learns `(author, data, signature)` can pair the payload with different
/// deps and obtain a distinct, validly-signed record. Kept for wire
/// compatibility; a future format revision should sign the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: Id,
    author: AuthorId,
    signature: Signature,
    deps: Vec<Id>,
    data: Vec<u8>,
}

impl Record {
    /// Build and sign a new record anchored at `deps`.
    pub fn create(identity: &AuthorIdentity, deps: Vec<Id>, data: Vec<u8>) -> Self {
        let author = identity.author_id();
        let id = crypto::record_id(&deps, &data, &author);
        let signature = identity.sign(&data);
        Self {
            id,
            author,
            signature,
            deps,
            data,
        }
    }

    /// Reassemble a record from its wire parts, re-deriving the id.
    ///
    /// The id is never transmitted; the caller must [`verify`](Self::verify)
    /// the result before trusting it.
    pub fn from_parts(
        author: AuthorId,
        signature: Signature,
        deps: Vec<Id>,
        data: Vec<u8>,
    ) -> Self {
        let id = crypto::record_id(&deps, &data, &author);
        Self {
            id,
            author,
            signature,
            deps,
            data,
        }
    }

    /// Check the record against its own id and signature.
    ///
    /// Fails with [`RecordError::HashMismatch`] when the recomputed content
    /// address differs from the stored id, and with
    /// [`RecordError::SignatureInvalid`] when Ed25519 verification of the
    /// payload fails.
    pub fn verify(&self) -> Result<(), RecordError> {
        let computed = crypto::record_id(&self.deps, &self.data, &self.author);
        if computed != self.id {
            return Err(RecordError::HashMismatch { id: self.id });
        }
        crypto::verify_payload(&self.author, &self.data, &self.signature)
            .map_err(|_| RecordError::SignatureInvalid { id: self.id })
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn author(&self) -> &AuthorId {
        &self.author
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn deps(&self) -> &[Id] {
        &self.deps
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True for records with no causal predecessors.
    pub fn is_genesis(&self) -> bool {
        self.deps.is_empty()
    }
}
