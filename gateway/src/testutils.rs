//! Helpers shared by the gateway's test modules: an in-process mock CMS and
//! factories for wiring a client or a whole gateway against it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use cms_client::client::CmsClient;
use cms_client::rate_limit::RateLimiter;
use serde_json::{Value as JsonValue, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use url::Url;

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<JsonValue>,
}

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    responses: Arc<Mutex<VecDeque<(u16, JsonValue)>>>,
    response_delay: Arc<Mutex<Duration>>,
}

pub struct MockCms {
    pub base_url: Url,
    state: MockState,
}

impl MockCms {
    /// Queue the response for the next recorded call. Calls beyond the queue
    /// get a plain `200 {}`.
    pub async fn push_response(&self, status: u16, body: JsonValue) {
        self.state.responses.lock().await.push_back((status, body));
    }

    /// Hold every response for `delay`. Calls are still recorded on arrival,
    /// so tests can watch dispatch while the upstream is slow.
    pub async fn set_response_delay(&self, delay: Duration) {
        *self.state.response_delay.lock().await = delay;
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().await.clone()
    }
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    state.calls.lock().await.push(RecordedCall {
        method: method.to_string(),
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        body: serde_json::from_slice(&body).ok(),
    });

    let delay = *state.response_delay.lock().await;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let canned = state.responses.lock().await.pop_front();
    let (status, body) = canned.unwrap_or((200, json!({})));
    (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
}

/// Start a mock CMS on an ephemeral port that records every call.
pub async fn spawn_mock_cms() -> MockCms {
    let state = MockState::default();
    let app = Router::new().fallback(record).with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockCms {
        base_url: Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        state,
    }
}

/// A client with millisecond pacing so tests spend no time in the limiter.
pub fn test_client(base_url: Url, token: Option<&str>) -> Arc<CmsClient> {
    let limiter = Arc::new(RateLimiter::new(
        Duration::from_millis(1),
        Duration::from_millis(1),
    ));
    Arc::new(
        CmsClient::new(
            base_url,
            token.map(str::to_owned),
            Duration::from_secs(5),
            limiter,
        )
        .unwrap(),
    )
}

/// Serve the gateway router on an ephemeral port, backed by the given client.
/// Returns the base URL to drive it with.
pub async fn spawn_gateway(client: Arc<CmsClient>) -> String {
    let app = crate::router(client);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}
