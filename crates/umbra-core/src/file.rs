//! File metadata records: the serialized description of a logical file.
//!
//! A record carries the file's name, size, modification time, and the
//! ordered digests of the chunks that reconstitute its content. The record
//! itself is stored as a blob addressed by the digest of its serialized
//! form, through the same path as chunks but in the "file" namespace.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::DriveResult;

/// Default chunk size used when splitting file content: 16MB.
pub const DEFAULT_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// One chunk of a file's content, in reassembly order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Position of this chunk within the file, starting at zero.
    pub index: u64,
    /// Digest of the chunk payload.
    pub digest: Digest,
}

/// Serialized description of a logical file plus its ordered chunk digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Name or path of the file.
    pub filename: String,
    /// Total content length in bytes.
    pub filesize: u64,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: u64,
    /// Size each chunk was split at; the final chunk may be shorter.
    pub chunksize: u64,
    /// Ordered chunk digests; concatenating the payloads yields the content.
    pub chunks: Vec<ChunkRef>,
}

impl FileRecord {
    /// Creates an empty record for a file, stamped with the current time.
    pub fn new(filename: impl Into<String>) -> Self {
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            filename: filename.into(),
            filesize: 0,
            mtime,
            chunksize: DEFAULT_CHUNK_SIZE,
            chunks: Vec::new(),
        }
    }

    /// Appends a chunk digest at the next index and grows the file size.
    pub fn append_chunk(&mut self, digest: Digest, len: u64) {
        self.chunks.push(ChunkRef {
            index: self.chunks.len() as u64,
            digest,
        });
        self.filesize += len;
    }

    /// Serializes the record to its JSON wire form.
    pub fn to_bytes(&self) -> DriveResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses a record from its JSON wire form.
    pub fn from_bytes(bytes: &[u8]) -> DriveResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Digest of the serialized record, its storage key.
    pub fn digest(&self) -> DriveResult<Digest> {
        Ok(Digest::of(&self.to_bytes()?))
    }
}
