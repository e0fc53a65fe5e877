//! Error types shared by every drive and the cache coordinator.

use thiserror::Error;

use crate::digest::Digest;

/// Result type alias for drive operations.
pub type DriveResult<T> = Result<T, DriveError>;

/// Error variants for drive operations.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Wraps standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested digest is absent from the queried scope.
    #[error("not found: {digest}")]
    NotFound {
        /// The digest that was not found.
        digest: Digest,
    },

    /// A lookup returned more than one match; never resolved by guessing.
    #[error("ambiguous result for {name:?}: {matches} matches")]
    Ambiguous {
        /// The name that was looked up.
        name: String,
        /// How many records matched.
        matches: usize,
    },

    /// Network or API failure talking to a backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// Data corruption detected: stored bytes do not hash to their digest.
    #[error("corrupt payload for {digest}: content hashes to {actual}")]
    Corruption {
        /// The digest the payload was stored under.
        digest: Digest,
        /// The digest the payload actually hashes to.
        actual: Digest,
    },

    /// A write could not be proven to land on any persistent child.
    #[error("write not durable: {succeeded} of {attempted} children accepted the write, none persistent")]
    NotDurable {
        /// Number of write-eligible children the Put was issued to.
        attempted: usize,
        /// Number of children that accepted the write.
        succeeded: usize,
    },

    /// Invalid configuration: empty child list, unknown provider, missing field.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error for file records or configs.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A string could not be parsed as a hex digest.
    #[error("invalid digest: {0:?}")]
    InvalidDigest(String),
}

impl DriveError {
    /// Returns true for the not-found variant; reads use this to keep
    /// scanning other children instead of failing outright.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriveError::NotFound { .. })
    }
}
