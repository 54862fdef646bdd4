//! Common test utilities: an in-process server over a mock torrent session
//! and a scratch catalog database.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use magnetplay_core::testing::MockSession;
use magnetplay_core::{Config, StreamingService, TorrentStore};
use magnetplay_server::{api::create_router, AppState};

/// In-process server with a controllable torrent session.
pub struct TestFixture {
    pub router: Router,
    pub session: Arc<MockSession>,
    pub store: Arc<TorrentStore>,
    /// Holds the scratch database directory for the fixture's lifetime.
    #[allow(dead_code)]
    pub temp_dir: TempDir,
}

/// Response from a test request.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON; `Null` when empty or not JSON.
    pub fn json(&self) -> Value {
        if self.bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config::default();
        let session = Arc::new(MockSession::new());
        let store = Arc::new(
            TorrentStore::open(&db_path, &config.database).expect("open catalog"),
        );
        let service = Arc::new(StreamingService::new(session.clone(), store.clone()));

        let state = Arc::new(AppState::new(config, service, None));
        let router = create_router(state);

        Self {
            router,
            session,
            store,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn get_with_range(&self, path: &str, range: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("Range", range)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    /// POST a raw string body (for malformed JSON and content-type tests).
    pub async fn post_raw(&self, path: &str, body: &str, content_type: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }
}
