#![warn(missing_docs)]

//! Umbra core: content model, Client contract, configuration, registry
//!
//! This crate defines the shared vocabulary of the Umbra storage system:
//! SHA-256 digests as content identity, file metadata records, the
//! polymorphic `Client` trait every drive implements, the drive
//! configuration shape, and the provider registry used at bootstrap.

pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod file;
pub mod registry;

pub use client::Client;
pub use config::DriveConfig;
pub use digest::Digest;
pub use error::{DriveError, DriveResult};
pub use file::{ChunkRef, FileRecord, DEFAULT_CHUNK_SIZE};
pub use registry::{Constructor, Registry};
