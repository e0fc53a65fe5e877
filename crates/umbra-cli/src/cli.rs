//! Command implementations for umbractl.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use umbra_core::{Client, DriveConfig, DriveError, DriveResult, FileRecord, Registry};

/// Tools for inspecting umbra drives.
#[derive(Parser)]
#[command(name = "umbractl")]
#[command(about = "Umbra storage CLI", long_about = None)]
pub struct Cli {
    /// Path to the drive configuration file.
    #[arg(short, long, env = "UMBRA_CONFIG", default_value = "/etc/umbra/config.json")]
    pub config: PathBuf,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// umbractl subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// List file records in the configured drive.
    Ls {
        /// Also print size, mtime, and record digest.
        #[arg(short, long)]
        long: bool,
    },
    /// Reassemble a file's content and write it to stdout.
    Cat {
        /// Filename recorded in the file's metadata.
        filename: String,
    },
}

/// Builds a registry with every built-in provider.
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    umbra_drive::register(&mut registry);
    umbra_cache::register(&mut registry);
    registry
}

/// Instantiates the configured drive.
pub fn bootstrap(config: &DriveConfig) -> DriveResult<Arc<dyn Client>> {
    default_registry().instantiate(config)
}

/// Fetches and parses every file record the drive knows about.
///
/// Records that fail to fetch or parse are skipped with a warning; one bad
/// record should not hide the rest of the listing.
pub async fn fetch_records(client: &dyn Client) -> DriveResult<Vec<FileRecord>> {
    let mut records = Vec::new();
    for digest in client.list_files().await? {
        match client.get_file(&digest).await {
            Ok(bytes) => match FileRecord::from_bytes(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(%digest, error = %e, "skipping unparseable file record"),
            },
            Err(e) => tracing::warn!(%digest, error = %e, "skipping unreadable file record"),
        }
    }
    Ok(records)
}

/// Finds the unique record named `filename`.
///
/// Several identical records collapse through content addressing; distinct
/// records sharing a name are surfaced as ambiguity, never guessed at.
pub async fn find_record(client: &dyn Client, filename: &str) -> anyhow::Result<FileRecord> {
    let mut matches: Vec<FileRecord> = Vec::new();
    for record in fetch_records(client).await? {
        if record.filename == filename && !matches.contains(&record) {
            matches.push(record);
        }
    }
    match matches.len() {
        0 => anyhow::bail!("no file named {:?}", filename),
        1 => Ok(matches.remove(0)),
        n => Err(DriveError::Ambiguous {
            name: filename.to_string(),
            matches: n,
        }
        .into()),
    }
}

/// Fetches a record's chunks in order and concatenates their payloads.
pub async fn assemble(client: &dyn Client, record: &FileRecord) -> DriveResult<Vec<u8>> {
    let mut chunks = record.chunks.clone();
    chunks.sort_by_key(|c| c.index);

    let mut content = Vec::with_capacity(record.filesize as usize);
    for chunk in &chunks {
        let payload = client.get_chunk(&chunk.digest, Some(record)).await?;
        content.extend_from_slice(&payload);
    }
    Ok(content)
}

impl Cli {
    /// Runs the selected subcommand against the configured drive.
    pub async fn run(&self) -> anyhow::Result<()> {
        let config = DriveConfig::from_file(&self.config)?;
        let client = bootstrap(&config)?;

        match &self.command {
            Command::Ls { long } => {
                let mut records = fetch_records(client.as_ref()).await?;
                records.sort_by(|a, b| a.filename.cmp(&b.filename));
                for record in records {
                    if *long {
                        println!(
                            "{:>12}  {:>12}  {}  {}",
                            record.filesize,
                            record.mtime,
                            record.digest()?,
                            record.filename
                        );
                    } else {
                        println!("{}", record.filename);
                    }
                }
            }
            Command::Cat { filename } => {
                let record = find_record(client.as_ref(), filename).await?;
                let content = assemble(client.as_ref(), &record).await?;
                use std::io::Write;
                std::io::stdout().write_all(&content)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::Digest;
    use umbra_drive::MemoryClient;

    async fn store_file(client: &MemoryClient, name: &str, content: &[u8]) -> FileRecord {
        let mut record = FileRecord::new(name);
        let digest = Digest::of(content);
        client.put_chunk(&digest, content.to_vec(), None).await.unwrap();
        record.append_chunk(digest, content.len() as u64);

        let bytes = record.to_bytes().unwrap();
        client.put_file(&Digest::of(&bytes), bytes.clone()).await.unwrap();
        record
    }

    #[tokio::test]
    async fn test_fetch_records_lists_stored_files() {
        let client = MemoryClient::new();
        store_file(&client, "a.txt", b"alpha").await;
        store_file(&client, "b.txt", b"beta").await;

        let records = fetch_records(&client).await.unwrap();
        let mut names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_fetch_records_skips_garbage() {
        let client = MemoryClient::new();
        store_file(&client, "good.txt", b"fine").await;
        let garbage = b"not a record".to_vec();
        client.put_file(&Digest::of(&garbage), garbage).await.unwrap();

        let records = fetch_records(&client).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "good.txt");
    }

    #[tokio::test]
    async fn test_find_and_assemble_round_trip() {
        let client = MemoryClient::new();
        store_file(&client, "notes.txt", b"chunked content").await;

        let record = find_record(&client, "notes.txt").await.unwrap();
        let content = assemble(&client, &record).await.unwrap();
        assert_eq!(content, b"chunked content");
    }

    #[tokio::test]
    async fn test_assemble_concatenates_chunks_in_order() {
        let client = MemoryClient::new();
        let mut record = FileRecord::new("multi.bin");
        for part in [b"first ".as_slice(), b"second ", b"third"] {
            let digest = Digest::of(part);
            client.put_chunk(&digest, part.to_vec(), None).await.unwrap();
            record.append_chunk(digest, part.len() as u64);
        }

        let content = assemble(&client, &record).await.unwrap();
        assert_eq!(content, b"first second third");
    }

    #[tokio::test]
    async fn test_distinct_records_with_same_name_are_ambiguous() {
        let client = MemoryClient::new();
        store_file(&client, "same.txt", b"version one").await;
        store_file(&client, "same.txt", b"version two").await;

        let err = find_record(&client, "same.txt").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DriveError>(),
            Some(DriveError::Ambiguous { matches: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_name_is_reported() {
        let client = MemoryClient::new();
        let err = find_record(&client, "nope.txt").await.unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[tokio::test]
    async fn test_bootstrap_from_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let root = dir.path().join("store");
        std::fs::write(
            &config_path,
            format!(
                r#"{{
                    "provider": "cache",
                    "children": [
                        {{"provider": "memory", "write": true}},
                        {{"provider": "local", "write": true, "root": {:?}}}
                    ]
                }}"#,
                root
            ),
        )
        .unwrap();

        let config = DriveConfig::from_file(&config_path).unwrap();
        let client = bootstrap(&config).unwrap();
        assert!(client.persistent());

        let payload = b"end to end".to_vec();
        let digest = Digest::of(&payload);
        client.put_chunk(&digest, payload.clone(), None).await.unwrap();
        assert_eq!(client.get_chunk(&digest, None).await.unwrap(), payload);
    }

    #[test]
    fn test_default_registry_has_all_providers() {
        let registry = default_registry();
        assert_eq!(
            registry.provider_names(),
            vec!["cache", "fail", "local", "memory"]
        );
    }
}
