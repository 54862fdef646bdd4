//! Enrichment handlers: movie details persistence, catalog views, snapshot
//! save, and the external filename lookup.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use magnetplay_core::enrichment::{parse_release_name, placeholder_details};
use magnetplay_core::TorrentRecord;

use super::error::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

fn success() -> Json<StatusResponse> {
    Json(StatusResponse { status: "success" })
}

/// POST /api/movie-details/{infoHash}
///
/// Write-through enrichment update for a known torrent.
pub async fn update_movie_details(
    State(state): State<Arc<AppState>>,
    Path(info_hash): Path<String>,
    ApiJson(details): ApiJson<serde_json::Value>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .service()
        .update_enrichment(&info_hash, &details)
        .await?;
    Ok(success())
}

/// GET /api/get-movie-details
///
/// All persisted records with their enrichment.
pub async fn get_movie_details(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TorrentRecord>>, ApiError> {
    Ok(Json(state.service().records()?))
}

/// POST /api/torrents/save-data/{infoHash}
///
/// Persist a caller-provided full snapshot.
pub async fn save_torrent_data(
    State(state): State<Arc<AppState>>,
    Path(info_hash): Path<String>,
    ApiJson(snapshot): ApiJson<TorrentRecord>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.service().save_torrent_data(&info_hash, snapshot).await?;
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub filename: Option<String>,
}

/// GET /search?filename=...
///
/// Look a release name up with the configured movie catalog; without one,
/// serve a filename-derived placeholder.
pub async fn search_movie(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filename = params
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing filename parameter"))?;

    let parsed = parse_release_name(&filename);
    debug!(filename, title = %parsed.title, year = ?parsed.year, "movie lookup");

    if let Some(lookup) = state.movie_lookup() {
        if let Some(details) = lookup.search(&parsed.title, parsed.year).await? {
            return Ok(Json(details));
        }
    }

    Ok(Json(placeholder_details(&parsed)))
}
