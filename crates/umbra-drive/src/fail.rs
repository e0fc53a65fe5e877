//! Fault-injection drive: every operation fails with a transport error.
//!
//! Used to prove the coordinator's durability and failover policies. The
//! capability bits are configurable so a failing drive can impersonate the
//! only persistent child in a test topology.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use umbra_core::{Client, Digest, DriveConfig, DriveError, DriveResult, FileRecord, Registry};

/// Registry constructor for the "fail" provider.
///
/// Recognized option: `persistent = "true"` to claim persistence.
pub fn from_config(_registry: &Registry, config: &DriveConfig) -> DriveResult<Arc<dyn Client>> {
    let persistent = config
        .options
        .get("persistent")
        .map(|v| v == "true")
        .unwrap_or(false);
    Ok(Arc::new(FailClient::new(persistent)))
}

/// Drive whose every operation returns a transport error.
pub struct FailClient {
    persistent: bool,
}

impl FailClient {
    /// Creates a failing drive claiming the given persistence bit.
    pub fn new(persistent: bool) -> Self {
        Self { persistent }
    }

    fn fail<T>(&self, op: &str) -> DriveResult<T> {
        Err(DriveError::Transport(format!(
            "fail drive: {} always fails",
            op
        )))
    }
}

#[async_trait]
impl Client for FailClient {
    async fn list_files(&self) -> DriveResult<BTreeSet<Digest>> {
        self.fail("list_files")
    }

    async fn list_chunks(&self) -> DriveResult<BTreeSet<Digest>> {
        self.fail("list_chunks")
    }

    async fn get_file(&self, _digest: &Digest) -> DriveResult<Vec<u8>> {
        self.fail("get_file")
    }

    async fn put_file(&self, _digest: &Digest, _content: Vec<u8>) -> DriveResult<()> {
        self.fail("put_file")
    }

    async fn get_chunk(&self, _digest: &Digest, _hint: Option<&FileRecord>) -> DriveResult<Vec<u8>> {
        self.fail("get_chunk")
    }

    async fn put_chunk(
        &self,
        _digest: &Digest,
        _content: Vec<u8>,
        _hint: Option<&FileRecord>,
    ) -> DriveResult<()> {
        self.fail("put_chunk")
    }

    fn local(&self) -> bool {
        true
    }

    fn persistent(&self) -> bool {
        self.persistent
    }
}
