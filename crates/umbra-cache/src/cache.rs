//! The replicating cache coordinator.
//!
//! A `CacheClient` owns an ordered set of child drives and is itself a
//! `Client`, so coordinators nest. Writes fan out concurrently to every
//! write-eligible child and succeed only once at least one persistent child
//! has accepted the bytes. Reads scan children in order and return the
//! first successful payload. Lists union the children's digest sets and
//! spawn a detached, best-effort repair pass that copies digests to the
//! writable children that lack them.
//!
//! Foreground fan-out runs on the caller's task, so cancelling the caller
//! cancels the in-flight child calls. Repair runs detached with its own
//! lifetime and never blocks or fails the list that triggered it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, warn};

use async_trait::async_trait;

use umbra_core::{Client, Digest, DriveConfig, DriveError, DriveResult, FileRecord, Registry};

/// Registers the "cache" provider.
pub fn register(registry: &mut Registry) {
    registry.register("cache", from_config);
}

/// Registry constructor for the "cache" provider.
///
/// Instantiates every entry of `config.children` through the registry and
/// wires their `write` flags into the coordinator.
pub fn from_config(registry: &Registry, config: &DriveConfig) -> DriveResult<Arc<dyn Client>> {
    let mut children = Vec::with_capacity(config.children.len());
    for child_config in &config.children {
        children.push(Child {
            client: registry.instantiate(child_config)?,
            write: child_config.write,
        });
    }
    Ok(Arc::new(CacheClient::new(children)?))
}

/// One child drive plus its write-eligibility flag.
///
/// Read-only mirrors (`write == false`) are excluded from fan-out writes
/// and from repair targets, but still serve reads and lists.
#[derive(Clone)]
pub struct Child {
    /// The child drive.
    pub client: Arc<dyn Client>,
    /// Whether fan-out writes target this child.
    pub write: bool,
}

impl Child {
    /// Wraps a drive as a coordinator child.
    pub fn new(client: Arc<dyn Client>, write: bool) -> Self {
        Self { client, write }
    }
}

/// The two content namespaces a drive holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    Files,
    Chunks,
}

async fn child_list(client: &Arc<dyn Client>, ns: Namespace) -> DriveResult<BTreeSet<Digest>> {
    match ns {
        Namespace::Files => client.list_files().await,
        Namespace::Chunks => client.list_chunks().await,
    }
}

async fn child_get(
    client: &Arc<dyn Client>,
    ns: Namespace,
    digest: &Digest,
    hint: Option<&FileRecord>,
) -> DriveResult<Vec<u8>> {
    match ns {
        Namespace::Files => client.get_file(digest).await,
        Namespace::Chunks => client.get_chunk(digest, hint).await,
    }
}

async fn child_put(
    client: &Arc<dyn Client>,
    ns: Namespace,
    digest: &Digest,
    content: Vec<u8>,
    hint: Option<&FileRecord>,
) -> DriveResult<()> {
    match ns {
        Namespace::Files => client.put_file(digest, content).await,
        Namespace::Chunks => client.put_chunk(digest, content, hint).await,
    }
}

/// Composite drive replicating across an ordered set of children.
pub struct CacheClient {
    children: Vec<Child>,
    // Digest → index of the child that last served it. An optimization
    // only: losing it affects latency, never correctness.
    locations: RwLock<HashMap<(Namespace, Digest), usize>>,
}

impl CacheClient {
    /// Builds a coordinator over the given children.
    ///
    /// The child set is fixed for the coordinator's lifetime; an empty set
    /// is a configuration error.
    pub fn new(children: Vec<Child>) -> DriveResult<Self> {
        if children.is_empty() {
            return Err(DriveError::Config(
                "cache drive requires at least one child".into(),
            ));
        }
        debug!(
            children = children.len(),
            writable = children.iter().filter(|c| c.write).count(),
            "created cache coordinator"
        );
        Ok(Self {
            children,
            locations: RwLock::new(HashMap::new()),
        })
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Fan-out write: issue the Put to every write-eligible child
    /// concurrently, wait for all, and succeed only if at least one
    /// persistent child accepted the write.
    async fn put_namespace(
        &self,
        ns: Namespace,
        digest: &Digest,
        content: Vec<u8>,
        hint: Option<&FileRecord>,
    ) -> DriveResult<()> {
        let writers: Vec<(usize, &Child)> = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.write)
            .collect();

        let attempted = writers.len();
        let puts = writers.iter().map(|(idx, child)| {
            let content = content.clone();
            async move { (*idx, child_put(&child.client, ns, digest, content, hint).await) }
        });

        let mut succeeded = 0;
        let mut durable = false;
        for (idx, result) in join_all(puts).await {
            match result {
                Ok(()) => {
                    succeeded += 1;
                    if self.children[idx].client.persistent() {
                        durable = true;
                    }
                }
                // A failed secondary never fails a durable write, but is
                // always recorded.
                Err(e) => warn!(child = idx, namespace = ?ns, %digest, error = %e, "child put failed"),
            }
        }

        if durable {
            Ok(())
        } else {
            Err(DriveError::NotDurable {
                attempted,
                succeeded,
            })
        }
    }

    /// Read scan: hinted child first, then construction order. Transient
    /// child errors and corrupt payloads are skipped; only exhaustion of
    /// every child is terminal.
    async fn get_namespace(
        &self,
        ns: Namespace,
        digest: &Digest,
        hint: Option<&FileRecord>,
    ) -> DriveResult<Vec<u8>> {
        let hinted = self.locations.read().get(&(ns, *digest)).copied();

        let order = hinted
            .into_iter()
            .chain((0..self.children.len()).filter(|idx| Some(*idx) != hinted));

        for idx in order {
            match child_get(&self.children[idx].client, ns, digest, hint).await {
                Ok(content) => {
                    // Any replica returning the correct digest is
                    // interchangeable; a mismatch is corruption, so keep
                    // scanning for an intact copy.
                    if let Err(e) = digest.verify(&content) {
                        warn!(child = idx, namespace = ?ns, error = %e, "skipping corrupt payload");
                        continue;
                    }
                    self.locations.write().insert((ns, *digest), idx);
                    return Ok(content);
                }
                Err(e) if e.is_not_found() => {
                    if Some(idx) == hinted {
                        self.locations.write().remove(&(ns, *digest));
                    }
                }
                Err(e) => {
                    warn!(child = idx, namespace = ?ns, %digest, error = %e, "child get failed, trying next");
                }
            }
        }

        Err(DriveError::NotFound { digest: *digest })
    }

    /// Union list: query every child concurrently, union the digest sets,
    /// and kick off detached repair for writable children that are missing
    /// digests present elsewhere.
    async fn list_namespace(&self, ns: Namespace) -> DriveResult<BTreeSet<Digest>> {
        let lists = self
            .children
            .iter()
            .map(|child| child_list(&child.client, ns));
        let results = join_all(lists).await;

        let mut per_child: Vec<Option<BTreeSet<Digest>>> = Vec::with_capacity(results.len());
        let mut union = BTreeSet::new();
        let mut successes = 0;
        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(set) => {
                    successes += 1;
                    union.extend(set.iter().copied());
                    per_child.push(Some(set));
                }
                Err(e) => {
                    warn!(child = idx, namespace = ?ns, error = %e, "child list failed");
                    per_child.push(None);
                }
            }
        }

        if successes == 0 {
            return Err(DriveError::Transport(format!(
                "all {} children failed to list",
                self.children.len()
            )));
        }

        // Seed the location cache from the per-child sets.
        {
            let mut locations = self.locations.write();
            for (idx, set) in per_child.iter().enumerate() {
                if let Some(set) = set {
                    for digest in set {
                        locations.entry((ns, *digest)).or_insert(idx);
                    }
                }
            }
        }

        // Divergence detected here is repaired off the critical path; the
        // caller gets the union either way.
        let needs_repair = per_child
            .iter()
            .enumerate()
            .any(|(idx, set)| match set {
                Some(set) => self.children[idx].write && *set != union,
                None => false,
            });
        if needs_repair {
            let children = self.children.clone();
            let union = union.clone();
            tokio::spawn(repair(children, ns, per_child, union));
        }

        Ok(union)
    }
}

/// Best-effort convergence pass: copy each digest a writable child lacks
/// from any child that holds it. Failures are logged and never surfaced.
async fn repair(
    children: Vec<Child>,
    ns: Namespace,
    per_child: Vec<Option<BTreeSet<Digest>>>,
    union: BTreeSet<Digest>,
) {
    let mut copied = 0usize;
    for digest in &union {
        let sources: Vec<usize> = per_child
            .iter()
            .enumerate()
            .filter(|(_, set)| set.as_ref().is_some_and(|s| s.contains(digest)))
            .map(|(idx, _)| idx)
            .collect();
        if sources.is_empty() {
            continue;
        }

        for (idx, child) in children.iter().enumerate() {
            // Children whose list failed are skipped: what they lack is
            // unknown, and repairing blind would re-put everything.
            let lacks = match &per_child[idx] {
                Some(set) => child.write && !set.contains(digest),
                None => false,
            };
            if !lacks {
                continue;
            }

            let Some(content) = fetch_intact(&children, &sources, ns, digest).await else {
                continue;
            };
            match child_put(&child.client, ns, digest, content, None).await {
                Ok(()) => copied += 1,
                Err(e) => {
                    warn!(child = idx, namespace = ?ns, %digest, error = %e, "repair put failed");
                }
            }
        }
    }
    if copied > 0 {
        debug!(namespace = ?ns, copied, "replica repair pass complete");
    }
}

/// Fetches `digest` from the source children in order, returning the first
/// payload whose bytes actually hash to `digest`. A replica can hold wrong
/// bytes under the right name; repair must never spread those to healthy
/// children.
async fn fetch_intact(
    children: &[Child],
    sources: &[usize],
    ns: Namespace,
    digest: &Digest,
) -> Option<Vec<u8>> {
    for &source in sources {
        let content = match child_get(&children[source].client, ns, digest, None).await {
            Ok(content) => content,
            Err(e) => {
                warn!(child = source, namespace = ?ns, %digest, error = %e, "repair fetch failed");
                continue;
            }
        };
        if let Err(e) = digest.verify(&content) {
            warn!(child = source, namespace = ?ns, error = %e, "repair source corrupt, trying next");
            continue;
        }
        return Some(content);
    }
    None
}

#[async_trait]
impl Client for CacheClient {
    async fn list_files(&self) -> DriveResult<BTreeSet<Digest>> {
        self.list_namespace(Namespace::Files).await
    }

    async fn list_chunks(&self) -> DriveResult<BTreeSet<Digest>> {
        self.list_namespace(Namespace::Chunks).await
    }

    async fn get_file(&self, digest: &Digest) -> DriveResult<Vec<u8>> {
        self.get_namespace(Namespace::Files, digest, None).await
    }

    async fn put_file(&self, digest: &Digest, content: Vec<u8>) -> DriveResult<()> {
        self.put_namespace(Namespace::Files, digest, content, None)
            .await
    }

    async fn get_chunk(&self, digest: &Digest, hint: Option<&FileRecord>) -> DriveResult<Vec<u8>> {
        self.get_namespace(Namespace::Chunks, digest, hint).await
    }

    async fn put_chunk(
        &self,
        digest: &Digest,
        content: Vec<u8>,
        hint: Option<&FileRecord>,
    ) -> DriveResult<()> {
        self.put_namespace(Namespace::Chunks, digest, content, hint)
            .await
    }

    /// Local only if every child keeps data on the host.
    fn local(&self) -> bool {
        self.children.iter().all(|c| c.client.local())
    }

    /// Persistent if any child survives a restart.
    fn persistent(&self) -> bool {
        self.children.iter().any(|c| c.client.persistent())
    }
}
