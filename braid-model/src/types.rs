//! Strong types for fixed-size byte arrays
//!
//! Everything that crosses the wire as raw bytes gets a semantic newtype:
//! record ids, author keys, signatures. Printable form is lowercase hex.

use std::fmt;

macro_rules! byte_array {
    ($name:ident, $len:expr, $doc:expr, [$($derives:ident),*]) => {
        #[doc = $doc]
        #[derive(Clone, Copy, serde::Serialize, serde::Deserialize, $($derives),*)]
        #[repr(transparent)]
        pub struct $name(#[serde(with = "serde_bytes")] pub [u8; $len]);

        impl $name {
            /// Byte length of this type on the wire.
            pub const LEN: usize = $len;

            /// Returns the inner bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Parse from a lowercase (or mixed-case) hex string.
            pub fn from_hex(s: &str) -> Result<Self, String> {
                let bytes = hex::decode(s).map_err(|e| format!("invalid hex: {}", e))?;
                Self::try_from(bytes.as_slice())
                    .map_err(|_| format!("expected {} bytes, got {}", $len, s.len() / 2))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(v: $name) -> [u8; $len] {
                v.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;
            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                Ok(Self(<[u8; $len]>::try_from(slice)?))
            }
        }

        impl fmt::LowerHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::LowerHex::fmt(self, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }
    };
}

byte_array!(
    Id,
    32,
    "32-byte record identifier: the SHA-256 of the record's canonical body",
    [PartialEq, Eq, Hash, Default, PartialOrd, Ord]
);

byte_array!(
    AuthorId,
    32,
    "32-byte Ed25519 public key identifying a record author",
    [PartialEq, Eq, Hash, Default, PartialOrd, Ord]
);

byte_array!(
    Signature,
    64,
    "64-byte Ed25519 signature",
    [PartialEq, Eq]
);
