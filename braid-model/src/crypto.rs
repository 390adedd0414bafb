//! Centralized cryptographic operations for Braid.
//!
//! **All** SHA-256 content addressing and Ed25519 signing/verification go
//! through this module, giving a single audit surface for cryptographic
//! correctness.
//!
//! # Primitives
//!
//! | Primitive | Algorithm        | Purpose                           |
//! |-----------|------------------|-----------------------------------|
//! | Id        | SHA-256 (32 B)   | Content addressing, DAG linkage   |
//! | Signature | Ed25519 (64 B)   | Record authentication             |
//! | Identity  | Ed25519 keypair  | Author identity                   |

use crate::types::{AuthorId, Id, Signature};
use sha2::{Digest, Sha256};

/// Compute the content address of a record body.
///
/// The hash input order is canonical and must never change: each
/// dependency id in the order given, then the payload, then the author
/// key. Peers that disagree on this order cannot reconcile.
pub fn record_id(deps: &[Id], data: &[u8], author: &AuthorId) -> Id {
    let mut hasher = Sha256::new();
    for dep in deps {
        hasher.update(dep.as_bytes());
    }
    hasher.update(data);
    hasher.update(author.as_bytes());
    Id(hasher.finalize().into())
}

/// Sign a record payload with an Ed25519 signing key.
///
/// The signature covers the payload bytes only, not the record id. See
/// the note on [`crate::record::Record`] for the implications.
pub fn sign_payload(signing_key: &ed25519_dalek::SigningKey, data: &[u8]) -> Signature {
    use ed25519_dalek::Signer;
    Signature(signing_key.sign(data).to_bytes())
}

/// Verify an Ed25519 signature over a record payload.
pub fn verify_payload(
    author: &AuthorId,
    data: &[u8],
    signature: &Signature,
) -> Result<(), CryptoError> {
    use ed25519_dalek::Verifier;
    let vk = verifying_key(author)?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(data, &sig).map_err(|_| CryptoError::InvalidSignature)
}

/// Deserialize an `AuthorId` into an Ed25519 `VerifyingKey`.
///
/// Fails if the 32 bytes are not a valid curve point.
pub fn verifying_key(author: &AuthorId) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
    ed25519_dalek::VerifyingKey::from_bytes(&author.0).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Cryptographic operation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid Ed25519 signature")]
    InvalidSignature,

    #[error("invalid Ed25519 public key")]
    InvalidPublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthorIdentity;

    #[test]
    fn record_id_depends_on_every_part() {
        let author = AuthorId([1u8; 32]);
        let other = AuthorId([2u8; 32]);
        let dep = Id([3u8; 32]);

        let base = record_id(&[dep], b"data", &author);
        assert_ne!(base, record_id(&[dep], b"datb", &author));
        assert_ne!(base, record_id(&[], b"data", &author));
        assert_ne!(base, record_id(&[dep], b"data", &other));
        assert_eq!(base, record_id(&[dep], b"data", &author));
    }

    #[test]
    fn record_id_is_sensitive_to_dep_order() {
        let author = AuthorId([1u8; 32]);
        let a = Id([3u8; 32]);
        let b = Id([4u8; 32]);
        assert_ne!(
            record_id(&[a, b], b"x", &author),
            record_id(&[b, a], b"x", &author)
        );
    }

    #[test]
    fn sign_verify_round_trip() {
        let identity = AuthorIdentity::generate();
        let sig = sign_payload(identity.signing_key(), b"payload");
        verify_payload(&identity.author_id(), b"payload", &sig).unwrap();
        assert_eq!(
            verify_payload(&identity.author_id(), b"tampered", &sig),
            Err(CryptoError::InvalidSignature)
        );
    }
}
