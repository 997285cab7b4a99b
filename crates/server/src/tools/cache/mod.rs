//! Cache-related MCP tools.
//!
//! This module reports on the SQLite-backed cache partitions.

pub mod partitions;

pub use partitions::partitions_impl;
