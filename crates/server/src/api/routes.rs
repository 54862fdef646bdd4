use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::{handlers, movies, stream, torrents};
use crate::state::AppState;

/// All routes live under this prefix.
pub const MOUNT_PREFIX: &str = "/magnet";

/// Body cap for small JSON requests.
const JSON_BODY_LIMIT: usize = 1024 * 1024;
/// Body cap for full snapshot saves.
const SNAPSHOT_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config().server.cors_allow_origin.as_str());

    let api = Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/magnet",
            post(torrents::add_magnet).layer(DefaultBodyLimit::max(JSON_BODY_LIMIT)),
        )
        .route("/api/torrents", get(torrents::list_torrents))
        .route("/api/files", get(torrents::list_files))
        .route(
            "/api/movie-details/{info_hash}",
            post(movies::update_movie_details).layer(DefaultBodyLimit::max(JSON_BODY_LIMIT)),
        )
        .route("/api/get-movie-details", get(movies::get_movie_details))
        .route(
            "/api/torrents/save-data/{info_hash}",
            post(movies::save_torrent_data).layer(DefaultBodyLimit::max(SNAPSHOT_BODY_LIMIT)),
        )
        .route("/stream/{info_hash}/{*file}", get(stream::stream_file))
        .route("/search", get(movies::search_movie))
        .with_state(state);

    Router::new()
        .nest(MOUNT_PREFIX, api)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    if allow_origin == "*" {
        return cors.allow_origin(Any);
    }

    match allow_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(allow_origin, error = %e, "invalid CORS origin, falling back to any");
            cors.allow_origin(Any)
        }
    }
}
