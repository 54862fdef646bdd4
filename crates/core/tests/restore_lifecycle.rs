//! Restart durability: records persisted by one service instance are
//! restored into a fresh session by the next instance over the same
//! database file.

use std::sync::Arc;

use magnetplay_core::testing::MockSession;
use magnetplay_core::{DatabaseConfig, StreamingService, TorrentStore};

const HASH_A: &str = "0123456789abcdef0123456789abcdef01234567";
const HASH_B: &str = "fedcba9876543210fedcba9876543210fedcba98";

fn magnet(hash: &str) -> String {
    format!("magnet:?xt=urn:btih:{hash}")
}

#[tokio::test]
async fn test_restart_restores_persisted_torrents() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("torrents.db");
    let db_config = DatabaseConfig::default();

    // First process lifetime: add two torrents, then shut down.
    {
        let session = Arc::new(MockSession::new());
        let store = Arc::new(TorrentStore::open(&db_path, &db_config).unwrap());
        let service = StreamingService::new(session, store.clone());

        service.add_magnet(&magnet(HASH_A)).await.unwrap();
        service.add_magnet(&magnet(HASH_B)).await.unwrap();

        service.close().await;
        store.optimize().unwrap();
    }

    // Second process lifetime: a fresh session knows nothing until restore.
    let session = Arc::new(MockSession::new());
    let store = Arc::new(TorrentStore::open(&db_path, &db_config).unwrap());
    let service = StreamingService::new(session.clone(), store);

    assert!(service.list().await.is_empty());

    let restored = service.restore_on_startup().await.unwrap();
    assert_eq!(restored, 2);

    let hashes: Vec<String> = service
        .list()
        .await
        .into_iter()
        .map(|t| t.info_hash)
        .collect();
    assert!(hashes.contains(&HASH_A.to_string()));
    assert!(hashes.contains(&HASH_B.to_string()));
}

#[tokio::test]
async fn test_restart_preserves_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("torrents.db");
    let db_config = DatabaseConfig::default();

    {
        let session = Arc::new(MockSession::new());
        let store = Arc::new(TorrentStore::open(&db_path, &db_config).unwrap());
        let service = StreamingService::new(session, store);

        service.add_magnet(&magnet(HASH_A)).await.unwrap();
        service
            .update_enrichment(HASH_A, &serde_json::json!({"title": "Durable"}))
            .await
            .unwrap();
    }

    let session = Arc::new(MockSession::new());
    let store = Arc::new(TorrentStore::open(&db_path, &db_config).unwrap());
    let service = StreamingService::new(session, store);
    service.restore_on_startup().await.unwrap();

    // Restore must not wipe stored enrichment.
    let torrents = service.list().await;
    let torrent = torrents.iter().find(|t| t.info_hash == HASH_A).unwrap();
    assert_eq!(torrent.movie_details.as_ref().unwrap()["title"], "Durable");
}
