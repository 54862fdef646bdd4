//! SQLite-backed torrent catalog.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;

use super::migrations::run_migrations;
use super::{StoreError, TorrentRecord};
use crate::config::DatabaseConfig;
use crate::session::FileEntry;

const COLUMNS: &str = "info_hash, name, magnet_uri, added_at, length, files, \
                       downloaded, progress, state, movie_details, created_at, updated_at";

/// Durable key-value view of [`TorrentRecord`] keyed by info-hash.
///
/// SQLite in WAL mode; writes are serialized through the connection mutex
/// while WAL keeps concurrent readers of the database file unblocked.
pub struct TorrentStore {
    conn: Mutex<Connection>,
}

impl TorrentStore {
    /// Open (and if necessary create) the catalog database at `path`.
    pub fn open(path: &Path, config: &DatabaseConfig) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Database(format!("create database dir: {e}")))?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn, config)
    }

    /// In-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, &DatabaseConfig::default())
    }

    fn from_connection(mut conn: Connection, config: &DatabaseConfig) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        // WAL lets catalog enumeration proceed while scalar updates commit.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;",
        )?;

        if config.max_connections == 0 {
            return Err(StoreError::Database(
                "database.max_connections must be at least 1".into(),
            ));
        }

        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert-or-replace a record. `updated_at` is refreshed; `created_at`
    /// of an existing row is preserved.
    pub fn put(&self, record: &TorrentRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let files_json = serde_json::to_string(&record.files)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let details_json = record
            .movie_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO torrents (info_hash, name, magnet_uri, added_at, length, files,
                                   downloaded, progress, state, movie_details, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             ON CONFLICT(info_hash) DO UPDATE SET
                name = excluded.name,
                magnet_uri = excluded.magnet_uri,
                added_at = excluded.added_at,
                length = excluded.length,
                files = excluded.files,
                downloaded = excluded.downloaded,
                progress = excluded.progress,
                state = excluded.state,
                movie_details = excluded.movie_details,
                updated_at = excluded.updated_at",
            params![
                record.info_hash.to_lowercase(),
                record.name,
                record.magnet_uri,
                record.added_at.to_rfc3339(),
                record.length as i64,
                files_json,
                record.downloaded as i64,
                record.progress,
                record.state.as_str(),
                details_json,
                now.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Fetch one record, or `None` if the info-hash is unknown.
    pub fn get(&self, info_hash: &str) -> Result<Option<TorrentRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let info_hash = info_hash.to_lowercase();

        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM torrents WHERE info_hash = ?"),
                params![info_hash],
                row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// All records, most recently added first. Used by startup restore and
    /// the catalog views.
    pub fn list(&self) -> Result<Vec<TorrentRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM torrents ORDER BY added_at DESC"))?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// A stable page of records plus the total count.
    pub fn list_paginated(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<TorrentRecord>, u64), StoreError> {
        let conn = self.conn.lock().unwrap();

        let total: u64 = conn.query_row("SELECT COUNT(*) FROM torrents", [], |row| {
            row.get::<_, i64>(0).map(|n| n as u64)
        })?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM torrents ORDER BY added_at DESC LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(params![limit, offset], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok((records, total))
    }

    /// Partial update touching only the enrichment payload and `updated_at`.
    pub fn update_enrichment(
        &self,
        info_hash: &str,
        details: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let info_hash = info_hash.to_lowercase();

        let details_json = serde_json::to_string(details)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let updated = conn.execute(
            "UPDATE torrents SET movie_details = ?, updated_at = ? WHERE info_hash = ?",
            params![details_json, Utc::now().to_rfc3339(), info_hash],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(info_hash));
        }
        Ok(())
    }

    /// Remove a record. Does not touch payload files on disk.
    pub fn delete(&self, info_hash: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let info_hash = info_hash.to_lowercase();

        let deleted = conn.execute("DELETE FROM torrents WHERE info_hash = ?", params![info_hash])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(info_hash));
        }
        Ok(())
    }

    /// Compact and re-analyze the database; run before shutdown.
    pub fn optimize(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        for sql in ["VACUUM", "ANALYZE", "PRAGMA optimize", "PRAGMA wal_checkpoint(TRUNCATE)"] {
            if let Err(e) = conn.execute_batch(sql) {
                // Best effort; keep going so one failed step does not block
                // shutdown.
                warn!(sql, error = %e, "catalog optimization step failed");
            }
        }
        Ok(())
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<TorrentRecord> {
    let added_at: String = row.get(3)?;
    let files_json: Option<String> = row.get(5)?;
    let state: String = row.get(8)?;
    let details_json: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;

    let files: Vec<FileEntry> = files_json
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| match serde_json::from_str(s) {
            Ok(files) => Some(files),
            Err(e) => {
                warn!(error = %e, "dropping unparseable file list from catalog row");
                None
            }
        })
        .unwrap_or_default();

    let movie_details = details_json
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| match serde_json::from_str(s) {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(error = %e, "dropping unparseable enrichment from catalog row");
                None
            }
        });

    Ok(TorrentRecord {
        info_hash: row.get(0)?,
        name: row.get(1)?,
        magnet_uri: row.get(2)?,
        added_at: parse_timestamp(&added_at),
        length: row.get::<_, i64>(4)? as u64,
        files,
        downloaded: row.get::<_, i64>(6)? as u64,
        progress: row.get(7)?,
        state: state.parse().unwrap_or_default(),
        movie_details,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
