//! In-memory torrent session for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::GatedFile;
use crate::session::{
    FileEntry, SessionError, StreamReader, TorrentInfo, TorrentSession, TorrentState,
};
use crate::validation;

struct MockTorrent {
    name: String,
    files: Vec<(String, GatedFile)>,
    metadata_ready: bool,
    added_at: DateTime<Utc>,
}

/// Controllable [`TorrentSession`] double.
///
/// Torrents registered up front carry in-memory file contents behind a
/// [`GatedFile`], so tests can model partially downloaded files. Unknown
/// magnets are accepted and produce an empty torrent, mirroring a swarm
/// that has delivered metadata for a content-less torrent.
#[derive(Default)]
pub struct MockSession {
    torrents: Mutex<HashMap<String, MockTorrent>>,
    added_magnets: Mutex<Vec<String>>,
    fail_with_timeout: AtomicBool,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a torrent whose files are fully downloaded.
    pub fn insert_torrent(&self, info_hash: &str, name: &str, files: Vec<(String, Vec<u8>)>) {
        let files = files
            .into_iter()
            .map(|(path, data)| (path, GatedFile::fully_available(data)))
            .collect();
        self.insert_gated(info_hash, name, files);
    }

    /// Register a torrent with caller-controlled availability per file.
    pub fn insert_gated(&self, info_hash: &str, name: &str, files: Vec<(String, GatedFile)>) {
        self.torrents.lock().unwrap().insert(
            info_hash.to_lowercase(),
            MockTorrent {
                name: name.to_string(),
                files,
                metadata_ready: true,
                added_at: Utc::now(),
            },
        );
    }

    /// Register a torrent whose metadata has not arrived yet.
    pub fn insert_without_metadata(&self, info_hash: &str) {
        self.torrents.lock().unwrap().insert(
            info_hash.to_lowercase(),
            MockTorrent {
                name: format!("torrent-{}", &info_hash[..info_hash.len().min(8)]),
                files: Vec::new(),
                metadata_ready: false,
                added_at: Utc::now(),
            },
        );
    }

    /// Make every subsequent `add_magnet` time out waiting for metadata.
    pub fn fail_with_metadata_timeout(&self, enabled: bool) {
        self.fail_with_timeout.store(enabled, Ordering::SeqCst);
    }

    /// Every magnet URI passed to `add_magnet`, in order.
    pub fn added_magnets(&self) -> Vec<String> {
        self.added_magnets.lock().unwrap().clone()
    }

    fn snapshot(info_hash: &str, torrent: &MockTorrent) -> TorrentInfo {
        let files = Self::entries(info_hash, torrent);
        let length: u64 = files.iter().map(|f| f.length).sum();
        let downloaded: u64 = torrent.files.iter().map(|(_, gate)| gate.available()).sum();
        let progress = if length > 0 {
            downloaded as f64 / length as f64
        } else {
            0.0
        };
        let finished = length > 0 && downloaded == length;

        TorrentInfo {
            info_hash: info_hash.to_string(),
            name: torrent.name.clone(),
            length,
            files,
            downloaded,
            progress,
            state: TorrentState::derive(finished, 1),
            added_at: torrent.added_at,
            movie_details: None,
        }
    }

    fn entries(info_hash: &str, torrent: &MockTorrent) -> Vec<FileEntry> {
        torrent
            .files
            .iter()
            .enumerate()
            .map(|(index, (path, gate))| {
                FileEntry::new(
                    path.clone(),
                    gate.len(),
                    gate.available(),
                    index,
                    info_hash.to_string(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl TorrentSession for MockSession {
    async fn add_magnet(&self, magnet_uri: &str) -> Result<TorrentInfo, SessionError> {
        let info_hash = validation::validate_magnet_uri(magnet_uri)
            .map_err(|e| SessionError::InvalidMagnet(e.to_string()))?;

        if self.fail_with_timeout.load(Ordering::SeqCst) {
            return Err(SessionError::MetadataTimeout(30));
        }

        self.added_magnets
            .lock()
            .unwrap()
            .push(magnet_uri.to_string());

        let mut torrents = self.torrents.lock().unwrap();
        let torrent = torrents
            .entry(info_hash.to_lowercase())
            .or_insert_with(|| MockTorrent {
                name: format!("torrent-{}", &info_hash[..8]),
                files: Vec::new(),
                metadata_ready: true,
                added_at: Utc::now(),
            });

        Ok(Self::snapshot(&info_hash.to_lowercase(), torrent))
    }

    async fn get(&self, info_hash: &str) -> Option<TorrentInfo> {
        let torrents = self.torrents.lock().unwrap();
        let key = info_hash.to_lowercase();
        torrents.get(&key).map(|t| Self::snapshot(&key, t))
    }

    async fn list(&self) -> Vec<TorrentInfo> {
        let torrents = self.torrents.lock().unwrap();
        let mut snapshots: Vec<TorrentInfo> = torrents
            .iter()
            .map(|(hash, torrent)| Self::snapshot(hash, torrent))
            .collect();
        snapshots.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        snapshots
    }

    async fn files(&self, info_hash: &str) -> Result<Vec<FileEntry>, SessionError> {
        let torrents = self.torrents.lock().unwrap();
        let key = info_hash.to_lowercase();
        let torrent = torrents
            .get(&key)
            .ok_or_else(|| SessionError::TorrentNotFound(key.clone()))?;

        if !torrent.metadata_ready {
            return Err(SessionError::MetadataIncomplete);
        }
        Ok(Self::entries(&key, torrent))
    }

    async fn open_reader(
        &self,
        info_hash: &str,
        file_index: usize,
    ) -> Result<StreamReader, SessionError> {
        let torrents = self.torrents.lock().unwrap();
        let key = info_hash.to_lowercase();
        let torrent = torrents
            .get(&key)
            .ok_or_else(|| SessionError::TorrentNotFound(key.clone()))?;

        let (_, gate) = torrent.files.get(file_index).ok_or_else(|| {
            SessionError::FileNotFound(format!("file index {file_index} out of range"))
        })?;

        Ok(StreamReader::new(Box::new(gate.reader()), gate.len()))
    }

    async fn close(&self) {}
}
