//! Core types and shared functionality for the Ouça Aqui offline worker.
//!
//! This crate provides:
//! - Request/response exchange types and the `Network` seam
//! - Versioned cache partitions with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;
pub mod network;

pub use cache::{CacheDb, CacheEntry, CacheStore, CacheVersions, PartitionPurpose};
pub use config::AppConfig;
pub use error::Error;
pub use exchange::{RequestMode, ResponseSource, WorkerRequest, WorkerResponse};
pub use network::Network;
