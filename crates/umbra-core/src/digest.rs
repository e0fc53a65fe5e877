//! Content digests: the SHA-256 identity of every stored payload.
//!
//! A digest is the only key a drive ever sees. Callers compute it before a
//! Put and present it on every subsequent Get; two payloads with equal
//! digests are the same content.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::{DriveError, DriveResult};

/// SHA-256 digest identifying a chunk or file record.
///
/// Digests order and hash by their raw bytes, so sets of digests are
/// deterministic regardless of which drive produced them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Length of a digest in bytes.
    pub const LEN: usize = 32;

    /// Computes the digest of a payload.
    pub fn of(payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Self(hasher.finalize().into())
    }

    /// Wraps raw digest bytes without hashing.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a digest from its 64-character hex form.
    pub fn from_hex(s: &str) -> DriveResult<Self> {
        let raw = hex::decode(s).map_err(|_| DriveError::InvalidDigest(s.to_string()))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| DriveError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the lowercase hex form, used as the on-disk and on-wire name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verifies that a payload hashes to this digest.
    ///
    /// Returns a `Corruption` error carrying the actual digest on mismatch;
    /// drives call this on read so corrupt bytes are never passed through.
    pub fn verify(&self, payload: &[u8]) -> DriveResult<()> {
        let actual = Digest::of(payload);
        if actual != *self {
            return Err(DriveError::Corruption {
                digest: *self,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(D::Error::custom)
    }
}
