//! Entry storage: upsert and lookup of response snapshots.

use std::collections::BTreeMap;

use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use crate::exchange::{ResponseSource, WorkerRequest, WorkerResponse};

/// A stored request/response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status_code: i32,
    pub headers_json: String,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheEntry {
    /// Snapshot a response for the given request.
    pub fn from_exchange(request: &WorkerRequest, response: &WorkerResponse) -> Self {
        Self {
            key_hash: compute_request_key(&request.method, &request.url),
            method: request.method.to_ascii_uppercase(),
            url: request.url.to_string(),
            status_code: i32::from(response.status),
            headers_json: serde_json::to_string(&response.headers).unwrap_or_else(|_| "{}".into()),
            body: response.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the response, marked as coming from the cache.
    pub fn into_response(self) -> WorkerResponse {
        let headers: BTreeMap<String, String> = serde_json::from_str(&self.headers_json).unwrap_or_default();
        WorkerResponse {
            status: u16::try_from(self.status_code).unwrap_or(200),
            headers,
            body: self.body.into(),
            source: ResponseSource::Cache,
        }
    }
}

const ENTRY_COLUMNS: &str = "key_hash, method, url, status_code, headers_json, body, stored_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheEntry> {
    Ok(CacheEntry {
        key_hash: row.get(0)?,
        method: row.get(1)?,
        url: row.get(2)?,
        status_code: row.get(3)?,
        headers_json: row.get(4)?,
        body: row.get(5)?,
        stored_at: row.get(6)?,
    })
}

impl CacheDb {
    /// Insert or replace an entry in a partition.
    ///
    /// The partition must already exist. When `quota` is set, the write is
    /// rejected with `Error::QuotaExceeded` if total stored body bytes
    /// (minus any entry being replaced) would exceed it.
    pub async fn put_entry(&self, partition: &str, entry: &CacheEntry, quota: Option<u64>) -> Result<(), Error> {
        let partition = partition.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                if let Some(quota) = quota {
                    let (used, replaced): (i64, i64) = conn.query_row(
                        "SELECT
                            COALESCE(SUM(LENGTH(body)), 0),
                            COALESCE(SUM(CASE WHEN partition = ?1 AND key_hash = ?2 THEN LENGTH(body) END), 0)
                         FROM entries",
                        params![partition, entry.key_hash],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )?;
                    let used = (used - replaced).max(0) as u64;
                    let requested = entry.body.len() as u64;
                    if used + requested > quota {
                        return Err(Error::QuotaExceeded { used, requested, quota });
                    }
                }

                conn.execute(
                    "INSERT INTO entries (
                        partition, key_hash, method, url, status_code, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status_code = excluded.status_code,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &partition,
                        &entry.key_hash,
                        &entry.method,
                        &entry.url,
                        &entry.status_code,
                        &entry.headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry from one partition.
    pub async fn get_entry(&self, partition: &str, key_hash: &str) -> Result<Option<CacheEntry>, Error> {
        let partition = partition.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE partition = ?1 AND key_hash = ?2");
                match conn.query_row(&sql, params![partition, key_hash], row_to_entry) {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Find an entry in any partition, oldest partition first.
    pub async fn match_entry(&self, key_hash: &str) -> Result<Option<CacheEntry>, Error> {
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let result = conn.query_row(
                    "SELECT e.key_hash, e.method, e.url, e.status_code, e.headers_json, e.body, e.stored_at
                     FROM entries e JOIN partitions p ON p.name = e.partition
                     WHERE e.key_hash = ?1 ORDER BY p.rowid LIMIT 1",
                    params![key_hash],
                    row_to_entry,
                );
                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a partition.
    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
