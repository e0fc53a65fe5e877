//! Local disk drive: persistent storage under a root directory.
//!
//! Layout is `<root>/files/<hex digest>` and `<root>/chunks/<hex digest>`.
//! Writes land in a temp file first and are renamed into place so a crash
//! never leaves a partially written blob under a valid digest name.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use umbra_core::{Client, Digest, DriveConfig, DriveError, DriveResult, FileRecord, Registry};

const FILES_DIR: &str = "files";
const CHUNKS_DIR: &str = "chunks";

/// Registry constructor for the "local" provider.
pub fn from_config(_registry: &Registry, config: &DriveConfig) -> DriveResult<Arc<dyn Client>> {
    let root = config
        .root
        .as_ref()
        .ok_or_else(|| DriveError::Config("local drive requires a root directory".into()))?;
    Ok(Arc::new(LocalClient::new(root)?))
}

/// Persistent drive storing blobs as hex-named files on local disk.
pub struct LocalClient {
    root: PathBuf,
}

impl LocalClient {
    /// Opens (creating if needed) a local drive rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> DriveResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(FILES_DIR))?;
        std::fs::create_dir_all(root.join(CHUNKS_DIR))?;
        debug!(root = %root.display(), "opened local drive");
        Ok(Self { root })
    }

    /// Root directory of this drive.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, namespace: &str, digest: &Digest) -> PathBuf {
        self.root.join(namespace).join(digest.to_hex())
    }

    async fn list_namespace(&self, namespace: &str) -> DriveResult<BTreeSet<Digest>> {
        let mut digests = BTreeSet::new();
        let mut entries = tokio::fs::read_dir(self.root.join(namespace)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            // Skip anything that does not decode as a digest, including
            // temp files left behind by an interrupted write.
            if let Some(name) = name.to_str() {
                if let Ok(digest) = Digest::from_hex(name) {
                    digests.insert(digest);
                }
            }
        }
        Ok(digests)
    }

    async fn read_blob(&self, namespace: &str, digest: &Digest) -> DriveResult<Vec<u8>> {
        let path = self.blob_path(namespace, digest);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriveError::NotFound { digest: *digest });
            }
            Err(e) => return Err(e.into()),
        };
        // Verify on read: a mismatch is corruption, never a pass-through.
        digest.verify(&content)?;
        Ok(content)
    }

    async fn write_blob(&self, namespace: &str, digest: &Digest, content: &[u8]) -> DriveResult<()> {
        let path = self.blob_path(namespace, digest);
        if tokio::fs::try_exists(&path).await? {
            // Content addressing: same digest means same bytes already stored.
            return Ok(());
        }
        // Unique temp name: two racing puts of the same digest must not
        // interleave writes into one temp file.
        let tmp = path.with_extension(format!("{:016x}.tmp", rand::random::<u64>()));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl Client for LocalClient {
    async fn list_files(&self) -> DriveResult<BTreeSet<Digest>> {
        self.list_namespace(FILES_DIR).await
    }

    async fn list_chunks(&self) -> DriveResult<BTreeSet<Digest>> {
        self.list_namespace(CHUNKS_DIR).await
    }

    async fn get_file(&self, digest: &Digest) -> DriveResult<Vec<u8>> {
        self.read_blob(FILES_DIR, digest).await
    }

    async fn put_file(&self, digest: &Digest, content: Vec<u8>) -> DriveResult<()> {
        self.write_blob(FILES_DIR, digest, &content).await
    }

    async fn get_chunk(&self, digest: &Digest, _hint: Option<&FileRecord>) -> DriveResult<Vec<u8>> {
        self.read_blob(CHUNKS_DIR, digest).await
    }

    async fn put_chunk(
        &self,
        digest: &Digest,
        content: Vec<u8>,
        _hint: Option<&FileRecord>,
    ) -> DriveResult<()> {
        self.write_blob(CHUNKS_DIR, digest, &content).await
    }

    fn local(&self) -> bool {
        true
    }

    fn persistent(&self) -> bool {
        true
    }
}
