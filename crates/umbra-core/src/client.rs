//! The polymorphic Client contract every drive implements.
//!
//! Drives are content-addressed blob stores with two namespaces: file
//! metadata records and chunks. The cache coordinator implements this same
//! trait, so coordinators compose over any mix of drives, including other
//! coordinators.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::digest::Digest;
use crate::error::DriveResult;
use crate::file::FileRecord;

/// A single storage provider holding content-addressed files and chunks.
///
/// All mutating operations are idempotent: re-putting an already-stored
/// (digest, payload) pair is a no-op success. Content addressing makes this
/// safe without reading the payload back.
#[async_trait]
pub trait Client: Send + Sync {
    /// Enumerates all file-record digests known to this drive.
    async fn list_files(&self) -> DriveResult<BTreeSet<Digest>>;

    /// Enumerates all chunk digests known to this drive.
    ///
    /// Symmetric with `list_files`; casual callers rarely need it, but the
    /// coordinator uses it for replica reconciliation.
    async fn list_chunks(&self) -> DriveResult<BTreeSet<Digest>>;

    /// Fetches the serialized file record stored under `digest`.
    async fn get_file(&self, digest: &Digest) -> DriveResult<Vec<u8>>;

    /// Stores serialized file-record bytes under `digest`. Idempotent.
    async fn put_file(&self, digest: &Digest, content: Vec<u8>) -> DriveResult<()>;

    /// Fetches the chunk stored under `digest`.
    ///
    /// `hint` optionally carries the owning file record so a drive can fetch
    /// from a more specific location; it is never required for correctness.
    async fn get_chunk(&self, digest: &Digest, hint: Option<&FileRecord>) -> DriveResult<Vec<u8>>;

    /// Stores chunk bytes under `digest`. Idempotent; drives should skip
    /// the upload entirely when the digest is already known to them.
    async fn put_chunk(
        &self,
        digest: &Digest,
        content: Vec<u8>,
        hint: Option<&FileRecord>,
    ) -> DriveResult<()>;

    /// Whether data stored in this drive never leaves the host.
    fn local(&self) -> bool;

    /// Whether data stored in this drive survives a process restart.
    fn persistent(&self) -> bool;
}
