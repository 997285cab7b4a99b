//! Partition bookkeeping: create, list and delete named partitions.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

use super::connection::CacheDb;
use crate::Error;

/// What a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PartitionPurpose {
    /// App shell, build assets, placeholders.
    Static,
    /// API responses and user-upload storage objects.
    Dynamic,
}

impl PartitionPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            PartitionPurpose::Static => "static",
            PartitionPurpose::Dynamic => "dynamic",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "static" => Some(PartitionPurpose::Static),
            "dynamic" => Some(PartitionPurpose::Dynamic),
            _ => None,
        }
    }
}

impl fmt::Display for PartitionPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one stored partition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionInfo {
    pub name: String,
    pub purpose: PartitionPurpose,
    pub created_at: String,
    pub entry_count: u64,
    pub stored_bytes: u64,
}

impl CacheDb {
    /// Create the partition if it does not exist yet.
    ///
    /// Opening an existing partition leaves its entries untouched.
    pub async fn open_partition(&self, name: &str, purpose: PartitionPurpose) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, purpose, created_at) VALUES (?1, ?2, ?3)",
                    params![name, purpose.as_str(), chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// All partition names in creation order.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Partition summaries in creation order.
    pub async fn partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.purpose, p.created_at,
                            COUNT(e.key_hash), COALESCE(SUM(LENGTH(e.body)), 0)
                     FROM partitions p LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.name
                     ORDER BY p.rowid",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(name, purpose, created_at, count, bytes)| {
                        let purpose = PartitionPurpose::parse(&purpose)
                            .ok_or_else(|| Error::MigrationFailed(format!("unknown partition purpose: {purpose}")))?;
                        Ok(PartitionInfo {
                            name,
                            purpose,
                            created_at,
                            entry_count: count as u64,
                            stored_bytes: bytes as u64,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and, through the cascade, all of its entries.
    ///
    /// Returns false if no partition had that name.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
