use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magnetplay_core::{
    load_config, validate_config, LibrqbitSession, MovieLookup, StreamingService, TmdbClient,
    TorrentStore,
};

use magnetplay_server::api::create_router;
use magnetplay_server::state::AppState;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_WINDOW: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("MAGNETPLAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {config_path:?}"))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!(env = ?config.server.env, "Configuration loaded");

    // Catalog first: it is the authority for known torrents.
    let store = Arc::new(
        TorrentStore::open(&config.database.path, &config.database)
            .context("Failed to open catalog database")?,
    );

    let session = Arc::new(
        LibrqbitSession::new(&config.torrent)
            .await
            .context("Failed to start torrent session")?,
    );

    let service = Arc::new(StreamingService::new(session, store.clone()));

    // Restore the swarm before the first request arrives; per-record errors
    // are already logged.
    if let Err(e) = service.restore_on_startup().await {
        warn!(error = %e, "catalog restore failed");
    }

    let movie_lookup: Option<Arc<dyn MovieLookup>> = match &config.api.tmdb_api_key {
        Some(key) => match TmdbClient::new(key.clone()) {
            Ok(client) => {
                info!("TMDB movie lookup enabled");
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!(error = %e, "TMDB lookup disabled");
                None
            }
        },
        None => None,
    };

    let addr = config.server.bind_address();
    let app_state = Arc::new(AppState::new(config, service.clone(), movie_lookup));
    let app = create_router(app_state);

    info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutdown signal received, draining in-flight requests");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_WINDOW, server).await {
        Ok(joined) => joined.context("Server task failed")?.context("Server error")?,
        Err(_) => warn!("Drain window elapsed, abandoning in-flight requests"),
    }

    info!("Closing torrent session");
    service.close().await;

    info!("Optimizing and closing catalog");
    if let Err(e) = store.optimize() {
        warn!(error = %e, "catalog optimization failed");
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
