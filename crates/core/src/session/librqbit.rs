//! Embedded librqbit torrent session.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use librqbit::api::TorrentIdOrHash;
use librqbit::{
    AddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session, SessionOptions,
};
use tracing::{debug, info, warn};

use super::reader::StreamReader;
use super::registry::HandleRegistry;
use super::{FileEntry, SessionError, TorrentInfo, TorrentSession, TorrentState};
use crate::config::TorrentConfig;
use crate::validation;

/// Well-known public trackers appended to every magnet to speed up peer
/// discovery.
const PUBLIC_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://open.stealth.si:80/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://explodie.org:6969/announce",
    "http://tracker.opentrackr.org:1337/announce",
    "http://tracker.openbittorrent.com:80/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://tracker.moeking.me:6969/announce",
    "udp://bt.oiyo.tk:6969/announce",
    "https://tracker.nanoha.org:443/announce",
    "https://tracker.lilithraws.org:443/announce",
];

#[derive(Clone)]
struct TorrentEntry {
    handle: Arc<ManagedTorrent>,
    added_at: DateTime<Utc>,
}

/// Torrent session backed by an embedded librqbit engine.
///
/// The engine owns peer discovery (trackers, DHT, PEX), piece verification,
/// and disk I/O under the configured data directory. Seeding stays enabled
/// and duplicate peer ids are dropped by the engine's connection manager.
pub struct LibrqbitSession {
    session: Arc<Session>,
    torrents: HandleRegistry<TorrentEntry>,
    metadata_timeout: Duration,
}

impl LibrqbitSession {
    /// Start a session rooted at the configured data directory.
    pub async fn new(config: &TorrentConfig) -> Result<Self, SessionError> {
        if !config.data_dir.exists() {
            std::fs::create_dir_all(&config.data_dir)
                .map_err(|e| SessionError::Engine(format!("create data directory: {e}")))?;
        }

        let opts = SessionOptions {
            disable_dht: !config.enable_dht,
            ..Default::default()
        };

        info!(
            data_dir = %config.data_dir.display(),
            dht_enabled = config.enable_dht,
            "initializing torrent session"
        );

        let session = Session::new_with_opts(config.data_dir.clone(), opts)
            .await
            .map_err(|e| SessionError::Engine(format!("initialize torrent session: {e}")))?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port, "torrent session listening on TCP port");
        }

        Ok(Self {
            session,
            torrents: HandleRegistry::new(),
            metadata_timeout: config.metadata_timeout(),
        })
    }

    /// Remove a torrent that never produced metadata in time.
    async fn discard(&self, info_hash: &str) {
        if let Ok(id) = TorrentIdOrHash::try_from(info_hash) {
            if let Err(e) = self.session.delete(id, false).await {
                debug!(info_hash, error = %e, "no half-added torrent to discard");
            }
        }
        self.torrents.remove(info_hash);
    }

    fn snapshot(&self, entry: &TorrentEntry) -> TorrentInfo {
        let handle = &entry.handle;
        let hash = handle.info_hash().as_string();
        let stats = handle.stats();

        let name = handle
            .name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("torrent-{}", &hash[..8]));

        let live_peers = stats
            .live
            .as_ref()
            .map(|live| live.snapshot.peer_stats.live as u32)
            .unwrap_or(0);
        let state = TorrentState::derive(stats.finished, live_peers);

        let progress = if stats.total_bytes > 0 {
            stats.progress_bytes as f64 / stats.total_bytes as f64
        } else {
            0.0
        };

        TorrentInfo {
            info_hash: hash.clone(),
            name,
            length: stats.total_bytes,
            files: self.file_entries(entry).unwrap_or_default(),
            downloaded: stats.progress_bytes,
            progress,
            state,
            added_at: entry.added_at,
            movie_details: None,
        }
    }

    /// Build per-file entries from engine metadata and completion counters.
    fn file_entries(&self, entry: &TorrentEntry) -> Result<Vec<FileEntry>, SessionError> {
        let handle = &entry.handle;
        let metadata = handle.metadata.load();
        let metadata = metadata.as_ref().ok_or(SessionError::MetadataIncomplete)?;

        let hash = handle.info_hash().as_string();
        let per_file = handle.stats().file_progress;

        // Metadata arrives from the swarm; a pathological structure must
        // fail this request, not the process.
        std::panic::catch_unwind(AssertUnwindSafe(|| {
            metadata
                .file_infos
                .iter()
                .enumerate()
                .map(|(index, file)| {
                    let path = file
                        .relative_filename
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    let completed = per_file.get(index).copied().unwrap_or(0).min(file.len);
                    FileEntry::new(path, file.len, completed, index, hash.clone())
                })
                .collect()
        }))
        .map_err(|_| {
            warn!(info_hash = %hash, "panic while traversing torrent metadata");
            SessionError::Engine("torrent metadata traversal failed".to_string())
        })
    }
}

#[async_trait]
impl TorrentSession for LibrqbitSession {
    async fn add_magnet(&self, magnet_uri: &str) -> Result<TorrentInfo, SessionError> {
        let requested_hash = validation::validate_magnet_uri(magnet_uri)
            .map_err(|e| SessionError::InvalidMagnet(e.to_string()))?;

        let augmented = augment_trackers(magnet_uri);
        let session = Arc::clone(&self.session);

        // The engine resolves magnet metadata inside add_torrent; run it on
        // its own task so a panic on malformed metadata is contained, and
        // bound the wait.
        let mut add_task = tokio::spawn(async move {
            session
                .add_torrent(
                    AddTorrent::from_url(&augmented),
                    Some(AddTorrentOptions {
                        overwrite: true,
                        ..Default::default()
                    }),
                )
                .await
        });

        let response = match tokio::time::timeout(self.metadata_timeout, &mut add_task).await {
            Err(_) => {
                add_task.abort();
                self.discard(&requested_hash).await;
                return Err(SessionError::MetadataTimeout(
                    self.metadata_timeout.as_secs(),
                ));
            }
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "torrent add task failed");
                return Err(SessionError::Engine(format!(
                    "torrent add aborted: {join_err}"
                )));
            }
            Ok(Ok(Err(e))) => {
                return Err(SessionError::Engine(format!("add torrent: {e:#}")));
            }
            Ok(Ok(Ok(response))) => response,
        };

        let handle = match response {
            AddTorrentResponse::Added(_, handle) => {
                debug!(info_hash = %handle.info_hash().as_string(), "torrent added");
                handle
            }
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                debug!(info_hash = %handle.info_hash().as_string(), "torrent already managed");
                handle
            }
            AddTorrentResponse::ListOnly(_) => {
                return Err(SessionError::Engine(
                    "torrent was added in list-only mode".to_string(),
                ));
            }
        };

        let hash = handle.info_hash().as_string();
        let entry = self.torrents.get(&hash).unwrap_or(TorrentEntry {
            handle,
            added_at: Utc::now(),
        });
        self.torrents.insert(&hash, entry.clone());

        Ok(self.snapshot(&entry))
    }

    async fn get(&self, info_hash: &str) -> Option<TorrentInfo> {
        self.torrents
            .get(info_hash)
            .map(|entry| self.snapshot(&entry))
    }

    async fn list(&self) -> Vec<TorrentInfo> {
        let mut snapshots: Vec<TorrentInfo> = self
            .torrents
            .snapshot()
            .iter()
            .map(|(_, entry)| self.snapshot(entry))
            .collect();
        snapshots.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        snapshots
    }

    async fn files(&self, info_hash: &str) -> Result<Vec<FileEntry>, SessionError> {
        let entry = self
            .torrents
            .get(info_hash)
            .ok_or_else(|| SessionError::TorrentNotFound(info_hash.to_string()))?;
        self.file_entries(&entry)
    }

    async fn open_reader(
        &self,
        info_hash: &str,
        file_index: usize,
    ) -> Result<StreamReader, SessionError> {
        let entry = self
            .torrents
            .get(info_hash)
            .ok_or_else(|| SessionError::TorrentNotFound(info_hash.to_string()))?;

        let length = {
            let metadata = entry.handle.metadata.load();
            let metadata = metadata.as_ref().ok_or(SessionError::MetadataIncomplete)?;
            metadata
                .file_infos
                .get(file_index)
                .map(|file| file.len)
                .ok_or_else(|| {
                    SessionError::FileNotFound(format!("file index {file_index} out of range"))
                })?
        };

        let stream = entry
            .handle
            .stream(file_index)
            .map_err(|e| SessionError::Engine(format!("open file stream: {e:#}")))?;

        Ok(StreamReader::new(Box::new(stream), length))
    }

    async fn close(&self) {
        info!("stopping torrent session");
        self.session.stop().await;
    }
}

/// Append the public tracker set to a magnet URI.
fn augment_trackers(magnet_uri: &str) -> String {
    let mut augmented = String::from(magnet_uri);
    for tracker in PUBLIC_TRACKERS {
        augmented.push_str("&tr=");
        augmented.extend(url::form_urlencoded::byte_serialize(tracker.as_bytes()));
    }
    augmented
}
