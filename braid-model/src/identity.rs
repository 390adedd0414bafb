//! Author identity and key management
//!
//! Each author owns an Ed25519 keypair:
//! - Private key: held locally, never replicated
//! - Public key: the author's identity on every record it signs (32 bytes)

use crate::crypto;
use crate::types::{AuthorId, Signature};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during identity operations
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
}

/// An author in a Braid swarm.
///
/// Owns the Ed25519 keypair used to sign records. The private key is held
/// by exactly one peer and never leaves this type.
#[derive(Clone)]
pub struct AuthorIdentity {
    signing_key: SigningKey,
}

impl AuthorIdentity {
    /// Generate a new identity with a random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Wrap an existing signing key.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Load an identity from a key file, or generate and save one if the
    /// file does not exist yet.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            let identity = Self::generate();
            identity.save(path)?;
            Ok(identity)
        }
    }

    /// Load an identity from a key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        use zeroize::Zeroizing;

        // Wipe both the heap buffer and the stack copy once the key is built.
        let bytes = Zeroizing::new(fs::read(path)?);
        if bytes.len() != 32 {
            return Err(IdentityError::InvalidKeyLength(bytes.len()));
        }
        let mut key_bytes = Zeroizing::new([0u8; 32]);
        key_bytes.copy_from_slice(&bytes);

        Ok(Self {
            signing_key: SigningKey::from_bytes(&key_bytes),
        })
    }

    /// Save the private key to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IdentityError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(self.signing_key.as_bytes())?;
        Ok(())
    }

    /// The author's public identity.
    pub fn author_id(&self) -> AuthorId {
        AuthorId(self.signing_key.verifying_key().to_bytes())
    }

    /// The signing key, for record creation.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Sign a payload.
    pub fn sign(&self, data: &[u8]) -> Signature {
        crypto::sign_payload(&self.signing_key, data)
    }
}

impl std::fmt::Debug for AuthorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorIdentity")
            .field("author_id", &self.author_id())
            .finish_non_exhaustive()
    }
}
