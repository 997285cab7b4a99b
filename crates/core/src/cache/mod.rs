//! SQLite-backed cache partitions for intercepted responses.
//!
//! This module provides a persistent request/response cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named, versioned partitions (static vs dynamic)
//! - Request keys derived from method + normalized URL (SHA-256)
//! - Automatic schema migrations
//! - Garbage collection of stale partitions on activate
//! - A total-size quota on stored bodies

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use partitions::{PartitionInfo, PartitionPurpose};
pub use store::{ActivateReport, CacheStore, CacheVersions, FailedAsset, InstallReport};
