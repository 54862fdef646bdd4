//! Orchestration over the torrent session and the durable catalog: adding
//! magnets, resolving stream requests, enrichment persistence, and startup
//! restore.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{StoreError, TorrentRecord, TorrentStore};
use crate::session::{FileEntry, SessionError, StreamReader, TorrentInfo, TorrentSession};
use crate::validation::{self, ValidationError};

/// Errors surfaced by the service layer. Lower-level kinds are preserved so
/// the HTTP boundary can map them to statuses exactly once.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Persistence failure: {0}")]
    Persistence(StoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::InvalidInput(e.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Persistence(other),
        }
    }
}

/// The orchestrator holding the session and the catalog.
pub struct StreamingService {
    session: Arc<dyn TorrentSession>,
    store: Arc<TorrentStore>,
}

impl StreamingService {
    pub fn new(session: Arc<dyn TorrentSession>, store: Arc<TorrentStore>) -> Self {
        Self { session, store }
    }

    /// Validate and add a magnet link, then persist its record.
    ///
    /// A persistence failure here is logged and swallowed: the torrent is
    /// already live in the session and the caller should get its info.
    pub async fn add_magnet(&self, magnet_uri: &str) -> Result<TorrentInfo, ServiceError> {
        validation::validate_magnet_uri(magnet_uri)?;

        let mut info = self.session.add_magnet(magnet_uri).await?;

        let mut record = TorrentRecord::new(info.info_hash.clone(), magnet_uri.trim());
        record.name = info.name.clone();
        record.length = info.length;
        record.files = info.files.clone();
        record.downloaded = info.downloaded;
        record.progress = info.progress;
        record.state = info.state;
        record.added_at = info.added_at;

        // Re-adding a known torrent must not lose its enrichment or its
        // original added-at time.
        match self.store.get(&info.info_hash) {
            Ok(Some(existing)) => {
                record.added_at = existing.added_at;
                record.movie_details = existing.movie_details.clone();
                info.added_at = existing.added_at;
                info.movie_details = existing.movie_details;
            }
            Ok(None) => {}
            Err(e) => warn!(info_hash = %info.info_hash, error = %e, "catalog lookup failed"),
        }

        if let Err(e) = self.store.put(&record) {
            warn!(info_hash = %info.info_hash, error = %e, "failed to persist torrent record");
        }

        Ok(info)
    }

    /// Live snapshots of all active torrents, with stored enrichment merged
    /// in. Progress always comes from the session, never the catalog.
    pub async fn list(&self) -> Vec<TorrentInfo> {
        let mut torrents = self.session.list().await;
        for torrent in &mut torrents {
            if let Ok(Some(record)) = self.store.get(&torrent.info_hash) {
                torrent.movie_details = record.movie_details;
            }
        }
        torrents
    }

    /// Snapshot of one active torrent.
    pub async fn get(&self, info_hash: &str) -> Result<TorrentInfo, ServiceError> {
        let info_hash = validation::validate_info_hash(info_hash)?;
        let mut info = self
            .session
            .get(&info_hash)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("torrent {info_hash}")))?;

        if let Ok(Some(record)) = self.store.get(&info_hash) {
            info.movie_details = record.movie_details;
        }
        Ok(info)
    }

    /// File listing of an active torrent.
    pub async fn files(&self, info_hash: &str) -> Result<Vec<FileEntry>, ServiceError> {
        let info_hash = validation::validate_info_hash(info_hash)?;
        match self.session.files(&info_hash).await {
            Ok(files) => Ok(files),
            Err(SessionError::TorrentNotFound(hash)) => {
                Err(ServiceError::NotFound(format!("torrent {hash}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a stream target and open a reader positioned at offset 0.
    ///
    /// `file_ref` is matched against file paths first; a bare integer is
    /// also accepted as a file index for older links.
    pub async fn open_stream(
        &self,
        info_hash: &str,
        file_ref: &str,
    ) -> Result<(StreamReader, FileEntry), ServiceError> {
        let info_hash = validation::validate_info_hash(info_hash)?;
        validation::validate_stream_path(file_ref)?;

        let files = match self.session.files(&info_hash).await {
            Ok(files) => files,
            Err(SessionError::TorrentNotFound(hash)) => {
                return Err(ServiceError::NotFound(format!("torrent {hash}")))
            }
            Err(e) => return Err(e.into()),
        };

        let entry = files
            .iter()
            .find(|f| f.path == file_ref)
            .or_else(|| {
                file_ref
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| files.iter().find(|f| f.file_index == index))
            })
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("file {file_ref}")))?;

        let reader = self.session.open_reader(&info_hash, entry.file_index).await?;
        Ok((reader, entry))
    }

    /// Write-through update of a record's enrichment payload.
    ///
    /// Enrichment for an info-hash the catalog does not know is rejected;
    /// enrichment-only records are never created.
    pub async fn update_enrichment(
        &self,
        info_hash: &str,
        details: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        let info_hash = validation::validate_info_hash(info_hash)?;
        self.store.update_enrichment(&info_hash, details)?;
        Ok(())
    }

    /// All persisted records, most recently added first.
    pub fn records(&self) -> Result<Vec<TorrentRecord>, ServiceError> {
        Ok(self.store.list()?)
    }

    /// Persist a caller-provided full snapshot. Unlike the add-magnet path,
    /// failure here is the caller's problem.
    pub async fn save_torrent_data(
        &self,
        info_hash: &str,
        mut snapshot: TorrentRecord,
    ) -> Result<(), ServiceError> {
        let info_hash = validation::validate_info_hash(info_hash)?;
        let snapshot_hash = validation::validate_info_hash(&snapshot.info_hash)?;

        if snapshot_hash != info_hash {
            return Err(ServiceError::InvalidInput(format!(
                "info-hash mismatch: url has {info_hash}, snapshot has {snapshot_hash}"
            )));
        }
        snapshot.info_hash = snapshot_hash;

        // A snapshot without a magnet must not strand the record at the
        // next restore.
        if snapshot.magnet_uri.is_empty() {
            if let Ok(Some(existing)) = self.store.get(&info_hash) {
                snapshot.magnet_uri = existing.magnet_uri;
            }
        }

        self.store.put(&snapshot)?;
        Ok(())
    }

    /// Re-add every record with a usable magnet, restoring the swarms
    /// before the first request arrives. Per-record failures are logged and
    /// skipped.
    pub async fn restore_on_startup(&self) -> Result<usize, ServiceError> {
        let records = self.store.list()?;
        let total = records.len();
        let mut restored = 0;

        for record in records {
            let Some(magnet_uri) = restore_magnet(&record) else {
                continue;
            };

            info!(info_hash = %record.info_hash, name = %record.name, "restoring torrent");
            match self.session.add_magnet(&magnet_uri).await {
                Ok(_) => restored += 1,
                Err(e) => {
                    warn!(info_hash = %record.info_hash, error = %e, "failed to restore torrent")
                }
            }
        }

        info!(restored, total, "catalog restore finished");
        Ok(restored)
    }

    /// Drain the session and flush disk I/O.
    pub async fn close(&self) {
        self.session.close().await;
    }
}

/// The magnet to restore a record with, if any. Records persisted with a
/// bare hash instead of a full URI still restore.
fn restore_magnet(record: &TorrentRecord) -> Option<String> {
    if record.magnet_uri.is_empty() {
        return None;
    }
    if record.magnet_uri.starts_with("magnet:?") {
        return Some(record.magnet_uri.clone());
    }
    Some(format!("magnet:?xt=urn:btih:{}", record.info_hash))
}
