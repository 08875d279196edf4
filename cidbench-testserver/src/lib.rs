//! In-process fake of the Kubo RPC and IPNI lookup endpoints.
//!
//! Uploaded content is kept in memory under a deterministic fake CID, so an upload run
//! followed by a download run against the same server round-trips.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash as _, Hasher as _};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_ADD: &str = "/api/v0/add";
pub const PATH_CAT: &str = "/api/v0/cat";
pub const PATH_FINDPROVS: &str = "/api/v0/routing/findprovs";
pub const PATH_INDEXER_CID: &str = "/cid/{cid}";

/// Peer ID reported as the provider of every stored block.
pub const PROVIDER_ID: &str = "12D3KooWCidbenchTestServerProvider";

#[derive(Debug, Clone, Default)]
pub struct TestServerOptions {
    /// Added before every response.
    pub delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    adds_total: Arc<AtomicU64>,
    cats_total: Arc<AtomicU64>,
    findprovs_total: Arc<AtomicU64>,
    indexer_lookups_total: Arc<AtomicU64>,
    not_found_total: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn adds_total(&self) -> u64 {
        self.adds_total.load(Ordering::Relaxed)
    }

    pub fn cats_total(&self) -> u64 {
        self.cats_total.load(Ordering::Relaxed)
    }

    pub fn findprovs_total(&self) -> u64 {
        self.findprovs_total.load(Ordering::Relaxed)
    }

    pub fn indexer_lookups_total(&self) -> u64 {
        self.indexer_lookups_total.load(Ordering::Relaxed)
    }

    pub fn not_found_total(&self) -> u64 {
        self.not_found_total.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
struct AppState {
    options: TestServerOptions,
    stats: TestServerStats,
    blocks: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl AppState {
    async fn enter(&self, counter: &AtomicU64) {
        TestServerStats::inc(&self.stats.requests_total);
        TestServerStats::inc(counter);
        if !self.options.delay.is_zero() {
            sleep(self.options.delay).await;
        }
    }

    fn lookup(&self, cid: &str) -> Option<Bytes> {
        let found = self
            .blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(cid)
            .cloned();
        if found.is_none() {
            TestServerStats::inc(&self.stats.not_found_total);
        }
        found
    }

    fn store(&self, content: Bytes) -> String {
        let cid = fake_cid(&content);
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(cid.clone(), content);
        cid
    }
}

/// Deterministic stand-in for a real CID: same bytes, same identifier.
pub fn fake_cid(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("bafkfake{:016x}{:08x}", hasher.finish(), content.len())
}

#[derive(Debug, Deserialize)]
struct ArgQuery {
    arg: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddResponse {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size")]
    size: String,
}

#[derive(Debug, Serialize)]
struct ApiError {
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Code")]
    code: u8,
    #[serde(rename = "Type")]
    kind: &'static str,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiError {
        message: message.into(),
        code: 0,
        kind: "error",
    };
    (status, axum::Json(body)).into_response()
}

async fn handle_add(State(state): State<AppState>, mut form: Multipart) -> Response {
    state.enter(&state.stats.adds_total).await;

    let field = match form.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return api_error(StatusCode::BAD_REQUEST, "file argument 'path' is required"),
        Err(err) => return api_error(StatusCode::BAD_REQUEST, err.to_string()),
    };

    let name = field.file_name().unwrap_or("file").to_string();
    let content = match field.bytes().await {
        Ok(b) => b,
        Err(err) => return api_error(StatusCode::BAD_REQUEST, err.to_string()),
    };

    let size = content.len();
    let hash = state.store(content);
    axum::Json(AddResponse {
        name,
        hash,
        size: size.to_string(),
    })
    .into_response()
}

async fn handle_cat(State(state): State<AppState>, Query(q): Query<ArgQuery>) -> Response {
    state.enter(&state.stats.cats_total).await;

    let Some(cid) = q.arg else {
        return api_error(StatusCode::BAD_REQUEST, "argument \"ipfs-path\" is required");
    };
    match state.lookup(&cid) {
        Some(content) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            content,
        )
            .into_response(),
        None => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "block was not found locally (offline)",
        ),
    }
}

async fn handle_findprovs(State(state): State<AppState>, Query(q): Query<ArgQuery>) -> Response {
    state.enter(&state.stats.findprovs_total).await;

    let Some(cid) = q.arg else {
        return api_error(StatusCode::BAD_REQUEST, "argument \"key\" is required");
    };

    // Routing event stream: a query event, then one provider record when the block is known.
    let mut events = vec![serde_json::json!({
        "Extra": "", "ID": "", "Responses": null, "Type": 0
    })];
    if state.lookup(&cid).is_some() {
        events.push(serde_json::json!({
            "Extra": "",
            "ID": "",
            "Responses": [{ "Addrs": ["/ip4/127.0.0.1/tcp/4001"], "ID": PROVIDER_ID }],
            "Type": 4
        }));
    }

    let body = events
        .iter()
        .map(|e| format!("{e}\n"))
        .collect::<String>();
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn handle_indexer(State(state): State<AppState>, Path(cid): Path<String>) -> Response {
    state.enter(&state.stats.indexer_lookups_total).await;

    if state.lookup(&cid).is_none() {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    axum::Json(serde_json::json!({
        "MultihashResults": [{
            "Multihash": cid,
            "ProviderResults": [{
                "ContextID": "",
                "Metadata": "gBI=",
                "Provider": { "ID": PROVIDER_ID, "Addrs": ["/ip4/127.0.0.1/tcp/4001"] }
            }]
        }]
    }))
    .into_response()
}

fn router_with_state(state: AppState) -> Router {
    Router::new()
        .route(PATH_ADD, post(handle_add))
        .route(PATH_CAT, post(handle_cat))
        .route(PATH_FINDPROVS, post(handle_findprovs))
        .route(PATH_INDEXER_CID, get(handle_indexer))
        .with_state(state)
}

pub fn router(options: TestServerOptions, stats: TestServerStats) -> Router {
    router_with_state(AppState {
        options,
        stats,
        blocks: Arc::default(),
    })
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    blocks: Arc<Mutex<HashMap<String, Bytes>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerOptions::default()).await
    }

    pub async fn start_with(options: TestServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = AppState {
            options,
            ..AppState::default()
        };
        let stats = state.stats.clone();
        let blocks = state.blocks.clone();
        let app = router_with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            blocks,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    /// Stores `content` as if it had been added, returning its CID.
    pub fn insert(&self, content: impl Into<Bytes>) -> String {
        let content = content.into();
        let cid = fake_cid(&content);
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(cid.clone(), content);
        cid
    }

    pub fn contains(&self, cid: &str) -> bool {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(cid)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cidbench_http::{HttpClient, HttpRequest, Multipart as Form};

    fn ok<T, E: std::fmt::Display>(r: Result<T, E>) -> T {
        r.unwrap_or_else(|e| panic!("{e}"))
    }

    #[tokio::test]
    async fn add_then_cat_round_trips() {
        let server = ok(TestServer::start().await);
        let client = HttpClient::default();

        let form = Form::new().file("file", "a.bin", b"hello blocks");
        let content_type = form.content_type();
        let res = ok(client
            .request(
                HttpRequest::post(format!("{}{PATH_ADD}", server.base_url()), form.finish())
                    .header("content-type", content_type),
            )
            .await);
        assert_eq!(res.status, 200);

        let added: serde_json::Value = ok(serde_json::from_slice(&res.body));
        let cid = added["Hash"].as_str().unwrap_or_default().to_string();
        assert_eq!(cid, fake_cid(b"hello blocks"));
        assert!(server.contains(&cid));

        let res = ok(client
            .request(HttpRequest::post(
                format!("{}{PATH_CAT}?arg={cid}", server.base_url()),
                Bytes::new(),
            ))
            .await);
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_ref(), b"hello blocks");

        assert_eq!(server.stats().adds_total(), 1);
        assert_eq!(server.stats().cats_total(), 1);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_cids_fail_on_every_endpoint() {
        let server = ok(TestServer::start().await);
        let client = HttpClient::default();
        let base = server.base_url().to_string();

        let cat = ok(client
            .request(HttpRequest::post(format!("{base}{PATH_CAT}?arg=bafymissing"), Bytes::new()))
            .await);
        assert_eq!(cat.status, 500);

        let lookup = ok(client.request(HttpRequest::get(format!("{base}/cid/bafymissing"))).await);
        assert_eq!(lookup.status, 404);

        let provs = ok(client
            .request(HttpRequest::post(
                format!("{base}{PATH_FINDPROVS}?arg=bafymissing"),
                Bytes::new(),
            ))
            .await);
        assert_eq!(provs.status, 200);
        assert!(!provs.body_utf8().unwrap_or_default().contains(PROVIDER_ID));

        assert_eq!(server.stats().not_found_total(), 3);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn known_cids_have_a_provider() {
        let server = ok(TestServer::start().await);
        let cid = server.insert(&b"block"[..]);
        let client = HttpClient::default();

        let provs = ok(client
            .request(HttpRequest::post(
                format!("{}{PATH_FINDPROVS}?arg={cid}&num-providers=1", server.base_url()),
                Bytes::new(),
            ))
            .await);
        assert!(provs.body_utf8().unwrap_or_default().contains(PROVIDER_ID));

        let lookup = ok(client.request(HttpRequest::get(format!("{}/cid/{cid}", server.base_url()))).await);
        assert_eq!(lookup.status, 200);
        assert_eq!(server.stats().requests_total(), 2);
        server.shutdown().await;
    }
}
