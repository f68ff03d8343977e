//! Test support
//!
//! In-process HTTP stub standing in for the posts and sentiment APIs.
//! Each stub replays a scripted list of responses; the last entry repeats
//! once the script runs out.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{PostsApiConfig, RetryConfig};

/// A request as seen by the stub
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: String,
}

struct StubState {
    script: Vec<(u16, String)>,
    delay: Duration,
    hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubServer {
    pub url: String,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start(script: Vec<(u16, String)>) -> Self {
        Self::start_with_delay(script, Duration::ZERO).await
    }

    pub async fn start_with_delay(script: Vec<(u16, String)>, delay: Duration) -> Self {
        assert!(!script.is_empty(), "stub needs at least one response");
        let state = Arc::new(StubState {
            script,
            delay,
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/v1/truthsocial/user/posts", addr),
            state,
        }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn respond(
    State(state): State<Arc<StubState>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        query,
        headers,
        body,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, body) = state.script[hit.min(state.script.len() - 1)].clone();
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Successful posts page body
pub fn page(posts: Value, next_max_id: Option<&str>) -> (u16, String) {
    let mut body = json!({ "success": true, "posts": posts });
    if let Some(cursor) = next_max_id {
        body["next_max_id"] = json!(cursor);
    }
    (200, body.to_string())
}

pub fn post(id: &str, text: &str) -> Value {
    json!({ "id": id, "text": text, "created_at": "2025-01-01T12:34:56.000Z" })
}

pub fn status(code: u16) -> (u16, String) {
    (code, json!({ "error": format!("status {}", code) }).to_string())
}

/// Posts config pointed at a stub with near-zero backoff
pub fn posts_config(url: &str) -> PostsApiConfig {
    PostsApiConfig {
        api_key: "test-key".to_string(),
        base_url: url.to_string(),
        retry: RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        ..PostsApiConfig::default()
    }
}
