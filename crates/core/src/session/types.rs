//! Types for the torrent session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::reader::StreamReader;
use crate::media;

/// Errors from torrent session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid magnet URI: {0}")]
    InvalidMagnet(String),

    #[error("Timed out waiting for torrent metadata after {0}s")]
    MetadataTimeout(u64),

    #[error("Torrent metadata not yet complete")]
    MetadataIncomplete,

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("File not found in torrent: {0}")]
    FileNotFound(String),

    #[error("Offset {offset} out of bounds for file of {length} bytes")]
    RangeOutOfBounds { offset: i64, length: u64 },

    #[error("Reader is closed")]
    ReaderClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Torrent engine error: {0}")]
    Engine(String),
}

/// Derived state of a torrent, refreshed on every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    #[default]
    Downloading,
    Completed,
    Stalled,
}

impl TorrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Downloading => "downloading",
            TorrentState::Completed => "completed",
            TorrentState::Stalled => "stalled",
        }
    }

    /// Derive the state from a completion predicate and live peer count.
    pub fn derive(finished: bool, active_peers: u32) -> Self {
        if finished {
            TorrentState::Completed
        } else if active_peers == 0 {
            TorrentState::Stalled
        } else {
            TorrentState::Downloading
        }
    }
}

impl FromStr for TorrentState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downloading" => Ok(TorrentState::Downloading),
            "completed" => Ok(TorrentState::Completed),
            "stalled" => Ok(TorrentState::Stalled),
            _ => Err(()),
        }
    }
}

/// A file within a torrent, as exposed on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Slash-separated path relative to the torrent root.
    pub path: String,
    /// File size in bytes.
    pub length: u64,
    /// Download progress of this file in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
    /// Position in the torrent's file list; the canonical file identifier.
    pub file_index: usize,
    /// Info-hash of the owning torrent.
    pub torrent_id: String,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub is_playable: bool,
}

impl FileEntry {
    /// Build an entry from metadata plus completion counters, classifying
    /// playability.
    pub fn new(
        path: String,
        length: u64,
        bytes_completed: u64,
        file_index: usize,
        torrent_id: String,
    ) -> Self {
        let progress = if length > 0 {
            bytes_completed as f64 / length as f64
        } else {
            0.0
        };
        let is_video = media::is_video(&path);
        let is_playable = is_video && media::is_playable(length, bytes_completed);

        Self {
            path,
            length,
            progress,
            file_index,
            torrent_id,
            is_video,
            is_playable,
        }
    }
}

/// Snapshot of one torrent, as exposed on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentInfo {
    /// Info-hash (lowercase hex).
    pub info_hash: String,
    pub name: String,
    /// Total payload size in bytes.
    pub length: u64,
    pub files: Vec<FileEntry>,
    pub downloaded: u64,
    pub progress: f64,
    pub state: TorrentState,
    pub added_at: DateTime<Utc>,
    /// Stored enrichment, merged in by the service layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_details: Option<serde_json::Value>,
}

/// The torrent session: owns peer connections, piece download, and disk I/O.
///
/// Implemented by the embedded engine for production and by a mock for
/// tests.
#[async_trait]
pub trait TorrentSession: Send + Sync {
    /// Add a magnet link and wait (bounded) for its metadata. Adding an
    /// already-managed torrent returns its current snapshot.
    async fn add_magnet(&self, magnet_uri: &str) -> Result<TorrentInfo, SessionError>;

    /// Snapshot of one torrent, or `None` if it is not active.
    async fn get(&self, info_hash: &str) -> Option<TorrentInfo>;

    /// Snapshots of all active torrents.
    async fn list(&self) -> Vec<TorrentInfo>;

    /// File listing for a torrent. Requires metadata.
    async fn files(&self, info_hash: &str) -> Result<Vec<FileEntry>, SessionError>;

    /// Open a piece-aware reader over one file.
    async fn open_reader(
        &self,
        info_hash: &str,
        file_index: usize,
    ) -> Result<StreamReader, SessionError>;

    /// Drain all swarms and flush disk I/O.
    async fn close(&self);
}
