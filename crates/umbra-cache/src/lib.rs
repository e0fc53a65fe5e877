#![warn(missing_docs)]

//! Umbra cache coordinator: replication across heterogeneous drives
//!
//! The `CacheClient` composite fans writes out to every write-eligible
//! child concurrently and reports success only once a persistent child has
//! the bytes, serves reads from the first child that can, and converges
//! divergent replicas through a detached best-effort repair pass triggered
//! by list operations.

pub mod cache;

pub use cache::{from_config, register, CacheClient, Child};
