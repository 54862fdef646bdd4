//! Torrent API handlers: add magnet, list torrents, list files.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use magnetplay_core::{FileEntry, TorrentInfo};

use super::error::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMagnetRequest {
    pub magnet_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct FilesParams {
    #[serde(rename = "infoHash")]
    pub info_hash: Option<String>,
}

/// POST /api/magnet
///
/// Validate and add a magnet link, returning the torrent snapshot once
/// metadata has arrived.
pub async fn add_magnet(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AddMagnetRequest>,
) -> Result<Json<TorrentInfo>, ApiError> {
    let info = state.service().add_magnet(&body.magnet_uri).await?;
    info!(info_hash = %info.info_hash, name = %info.name, "magnet added");
    Ok(Json(info))
}

/// GET /api/torrents
///
/// Live snapshots of all active torrents, enrichment merged in.
pub async fn list_torrents(State(state): State<Arc<AppState>>) -> Json<Vec<TorrentInfo>> {
    Json(state.service().list().await)
}

/// GET /api/files?infoHash=...
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilesParams>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let info_hash = params
        .info_hash
        .ok_or_else(|| ApiError::bad_request("Missing infoHash parameter"))?;

    let files = state.service().files(&info_hash).await?;
    Ok(Json(files))
}
