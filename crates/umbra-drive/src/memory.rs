//! In-memory drive: a fast, volatile test double.
//!
//! Local and non-persistent; pairing one with a durable drive under the
//! cache coordinator is how a speed layer sits in front of a backing store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use umbra_core::{Client, Digest, DriveConfig, DriveError, DriveResult, FileRecord, Registry};

/// Registry constructor for the "memory" provider.
pub fn from_config(_registry: &Registry, _config: &DriveConfig) -> DriveResult<Arc<dyn Client>> {
    Ok(Arc::new(MemoryClient::new()))
}

/// Volatile in-memory drive backed by two digest-keyed maps.
#[derive(Default)]
pub struct MemoryClient {
    files: RwLock<HashMap<Digest, Vec<u8>>>,
    chunks: RwLock<HashMap<Digest, Vec<u8>>>,
}

impl MemoryClient {
    /// Creates an empty in-memory drive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored file records; test inspection helper.
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Number of stored chunks; test inspection helper.
    pub fn chunk_count(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether a file record is present; test inspection helper.
    pub fn contains_file(&self, digest: &Digest) -> bool {
        self.files.read().contains_key(digest)
    }

    /// Whether a chunk is present; test inspection helper.
    pub fn contains_chunk(&self, digest: &Digest) -> bool {
        self.chunks.read().contains_key(digest)
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn list_files(&self) -> DriveResult<BTreeSet<Digest>> {
        Ok(self.files.read().keys().copied().collect())
    }

    async fn list_chunks(&self) -> DriveResult<BTreeSet<Digest>> {
        Ok(self.chunks.read().keys().copied().collect())
    }

    async fn get_file(&self, digest: &Digest) -> DriveResult<Vec<u8>> {
        self.files
            .read()
            .get(digest)
            .cloned()
            .ok_or(DriveError::NotFound { digest: *digest })
    }

    async fn put_file(&self, digest: &Digest, content: Vec<u8>) -> DriveResult<()> {
        self.files.write().insert(*digest, content);
        Ok(())
    }

    async fn get_chunk(&self, digest: &Digest, _hint: Option<&FileRecord>) -> DriveResult<Vec<u8>> {
        self.chunks
            .read()
            .get(digest)
            .cloned()
            .ok_or(DriveError::NotFound { digest: *digest })
    }

    async fn put_chunk(
        &self,
        digest: &Digest,
        content: Vec<u8>,
        _hint: Option<&FileRecord>,
    ) -> DriveResult<()> {
        self.chunks.write().insert(*digest, content);
        Ok(())
    }

    fn local(&self) -> bool {
        true
    }

    fn persistent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsuite;

    #[tokio::test]
    async fn test_file_round_trip() {
        let client = MemoryClient::new();
        testsuite::file_round_trip(&client, 100).await;
    }

    #[tokio::test]
    async fn test_chunk_round_trip() {
        let client = MemoryClient::new();
        testsuite::chunk_round_trip(&client, 100).await;
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let client = MemoryClient::new();
        let digest = Digest::of(b"absent");
        let err = client.get_file(&digest).await.unwrap_err();
        assert!(err.is_not_found());
        let err = client.get_chunk(&digest, None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let client = MemoryClient::new();
        let payload = b"same bytes".to_vec();
        let digest = Digest::of(&payload);

        client.put_chunk(&digest, payload.clone(), None).await.unwrap();
        client.put_chunk(&digest, payload.clone(), None).await.unwrap();

        assert_eq!(client.chunk_count(), 1);
        assert_eq!(client.get_chunk(&digest, None).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_namespaces_are_separate() {
        let client = MemoryClient::new();
        let digest = Digest::of(b"shared key");

        client.put_file(&digest, b"record".to_vec()).await.unwrap();
        assert!(client.contains_file(&digest));
        assert!(!client.contains_chunk(&digest));
        assert!(client.get_chunk(&digest, None).await.is_err());
    }

    #[tokio::test]
    async fn test_capabilities() {
        let client = MemoryClient::new();
        assert!(client.local());
        assert!(!client.persistent());
    }

    #[tokio::test]
    async fn test_parallel_round_trip() {
        let client = Arc::new(MemoryClient::new());
        testsuite::parallel_chunk_round_trip(client, 100).await;
    }
}
