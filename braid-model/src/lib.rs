//! Braid Model
//!
//! Pure data types for the Braid partial-order log, decoupled from the
//! log structures, replication engine, and network stacks:
//! - **Id / AuthorId / Signature**: strong types for the wire's byte arrays
//! - **crypto**: SHA-256 content addressing and Ed25519 sign/verify
//! - **AuthorIdentity**: keypair ownership and key-file management
//! - **Record**: the signed, content-addressed causal unit
//! - **wire**: the bit-exact record/batch codec
//! - **Bitmap**: dense visited-set bit vector for DAG traversals

pub mod bitmap;
pub mod crypto;
pub mod identity;
pub mod record;
pub mod types;
pub mod wire;

pub use bitmap::Bitmap;
pub use crypto::CryptoError;
pub use identity::{AuthorIdentity, IdentityError};
pub use record::{Record, RecordError};
pub use types::{AuthorId, Id, Signature};
pub use wire::{WireError, MAX_DEPS, MAX_PAYLOAD_SIZE};
