//! Types for the durable torrent catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{FileEntry, TorrentState};

/// A persisted torrent, keyed by info-hash (lowercase hex).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentRecord {
    /// Info-hash (lowercase hex).
    pub info_hash: String,
    /// Display name; populated once metadata arrives.
    #[serde(default)]
    pub name: String,
    /// The magnet URI the torrent was added with. Empty records are never
    /// auto-restored.
    #[serde(default)]
    pub magnet_uri: String,
    /// Total payload size in bytes.
    #[serde(default)]
    pub length: u64,
    /// Files within the torrent, in metadata order.
    #[serde(default)]
    pub files: Vec<FileEntry>,
    /// Bytes downloaded at the time of the last snapshot.
    #[serde(default)]
    pub downloaded: u64,
    /// Download progress in `[0, 1]` at the time of the last snapshot.
    #[serde(default)]
    pub progress: f64,
    /// Torrent state at the time of the last snapshot.
    #[serde(default)]
    pub state: TorrentState,
    /// When the torrent was added.
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
    /// When the record was first written.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Opaque enrichment payload, stored write-through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_details: Option<serde_json::Value>,
}

impl TorrentRecord {
    /// Minimal record for a freshly added magnet.
    pub fn new(info_hash: impl Into<String>, magnet_uri: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            info_hash: info_hash.into(),
            name: String::new(),
            magnet_uri: magnet_uri.into(),
            length: 0,
            files: Vec::new(),
            downloaded: 0,
            progress: 0.0,
            state: TorrentState::default(),
            added_at: now,
            created_at: now,
            updated_at: now,
            movie_details: None,
        }
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}
