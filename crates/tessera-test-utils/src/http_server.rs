//! Async HTTP test servers.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use parking_lot::Mutex;
use serde_json::Value;
use tessera_core::{SessionId, StreamGroup};
use tokio::net::TcpListener;
use url::Url;

use crate::{chunk_path, chunk_payload, listing_body, listing_record};

/// Lightweight HTTP test server wrapper.
pub struct TestHttpServer {
    base_url: Url,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestHttpServer {
    /// Spawn `router` on a random localhost port.
    ///
    /// # Panics
    ///
    /// Panics if listener bind or URL parsing fails.
    pub async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test HTTP listener");
        let addr = listener
            .local_addr()
            .expect("read test listener local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });
        tokio::spawn(async move {
            server.await.expect("run test HTTP server");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("parse base URL"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Join path to server base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("join server URL path")
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

#[derive(Default)]
struct ChunkState {
    listings: HashMap<String, Value>,
    media: HashMap<String, Bytes>,
    failures: HashMap<String, StatusCode>,
    delays: HashMap<String, Duration>,
    requests: Vec<String>,
}

/// Recording backend: serves listings under `/api/sessions/{id}/chunks`
/// and chunk bytes under `/media/{path}`, with per-path failure and delay
/// injection.
pub struct ChunkServer {
    server: TestHttpServer,
    state: Arc<Mutex<ChunkState>>,
}

impl ChunkServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(ChunkState::default()));
        let router = Router::new()
            .route("/api/sessions/{session}/chunks", get(listing))
            .route("/media/{*path}", get(media))
            .with_state(Arc::clone(&state));
        Self {
            server: TestHttpServer::new(router).await,
            state,
        }
    }

    /// Base the listing API lives under.
    #[must_use]
    pub fn api_base(&self) -> Url {
        self.server.url("api")
    }

    /// Base relative chunk paths resolve against.
    #[must_use]
    pub fn media_base(&self) -> Url {
        self.server.url("media/")
    }

    /// Publish `indices` of `group` for `session`: listing records plus
    /// [`chunk_payload`] bodies. Later calls for the same session append.
    pub fn publish(&self, session: &SessionId, group: StreamGroup, indices: &[u64]) {
        let mut state = self.state.lock();
        for &index in indices {
            state.media.insert(
                chunk_path(session, group, index),
                chunk_payload(group, index),
            );
        }
        let listing = state
            .listings
            .entry(session.to_string())
            .or_insert_with(|| listing_body(Vec::new()));
        if let Some(records) = listing.get_mut("chunks").and_then(Value::as_array_mut) {
            records.extend(indices.iter().map(|&i| listing_record(session, group, i)));
        }
    }

    /// Replace the raw listing body for `session`.
    pub fn set_listing(&self, session: &SessionId, body: Value) {
        self.state.lock().listings.insert(session.to_string(), body);
    }

    /// Answer `path` (relative to the media base) with `status`.
    pub fn fail(&self, path: &str, status: StatusCode) {
        self.state.lock().failures.insert(path.to_string(), status);
    }

    /// Delay answers for `path` (relative to the media base).
    pub fn delay(&self, path: &str, delay: Duration) {
        self.state.lock().delays.insert(path.to_string(), delay);
    }

    /// Request paths seen so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }
}

async fn listing(
    State(state): State<Arc<Mutex<ChunkState>>>,
    Path(session): Path<String>,
) -> Response {
    let body = {
        let mut state = state.lock();
        state.requests.push(format!("api/sessions/{session}/chunks"));
        state.listings.get(&session).cloned()
    };
    match body {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn media(State(state): State<Arc<Mutex<ChunkState>>>, Path(path): Path<String>) -> Response {
    let (delay, failure, body) = {
        let mut state = state.lock();
        state.requests.push(format!("media/{path}"));
        (
            state.delays.get(&path).copied(),
            state.failures.get(&path).copied(),
            state.media.get(&path).cloned(),
        )
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = failure {
        return status.into_response();
    }
    match body {
        Some(body) => body.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
