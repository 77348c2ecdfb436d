//! In-process stand-in for the open platform, used by the client tests.
//!
//! Serves the three endpoints the client talks to on an ephemeral port and
//! records every request it receives, in arrival order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::json;

pub const TOKEN_ROUTE: &str = "/auth/v3/tenant_access_token/internal";
pub const IMAGES_ROUTE: &str = "/im/v1/images";
pub const MESSAGES_ROUTE: &str = "/im/v1/messages";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Canned behaviour of the mock platform.
#[derive(Clone)]
pub struct MockPlatform {
    token_status: StatusCode,
    token_code: i64,
    token_msg: String,
    token_expire: Option<u64>,
    omit_token: bool,
    upload_status: StatusCode,
    omit_image_key: bool,
    /// 1-based upload call that should be rejected.
    fail_upload_on: Option<usize>,
    send_status: StatusCode,
    send_code: i64,
    send_msg: String,
    omit_send_data: bool,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            token_status: StatusCode::OK,
            token_code: 0,
            token_msg: "ok".into(),
            token_expire: Some(7200),
            omit_token: false,
            upload_status: StatusCode::OK,
            omit_image_key: false,
            fail_upload_on: None,
            send_status: StatusCode::OK,
            send_code: 0,
            send_msg: "success".into(),
            omit_send_data: false,
        }
    }
}

impl MockPlatform {
    pub fn with_token_expire(mut self, expire: Option<u64>) -> Self {
        self.token_expire = expire;
        self
    }

    pub fn with_token_code(mut self, code: i64, msg: &str) -> Self {
        self.token_code = code;
        self.token_msg = msg.into();
        self
    }

    /// Answer the token route with `status` and `{code: 500, msg}`.
    pub fn with_token_status(mut self, status: StatusCode, msg: &str) -> Self {
        self.token_status = status;
        self.token_code = 500;
        self.token_msg = msg.into();
        self
    }

    /// Reply `code: 0` without a `tenant_access_token`.
    pub fn without_token(mut self) -> Self {
        self.omit_token = true;
        self
    }

    /// Answer every upload with `status` and a JSON error body.
    pub fn with_upload_status(mut self, status: StatusCode) -> Self {
        self.upload_status = status;
        self
    }

    /// Reply `code: 0` to uploads without `data.image_key`.
    pub fn without_image_key(mut self) -> Self {
        self.omit_image_key = true;
        self
    }

    /// Reply `code: 0` to deliveries without a `data` object.
    pub fn without_send_data(mut self) -> Self {
        self.omit_send_data = true;
        self
    }

    pub fn failing_upload_on(mut self, call: usize) -> Self {
        self.fail_upload_on = Some(call);
        self
    }

    pub fn with_send_result(mut self, status: StatusCode, code: i64, msg: &str) -> Self {
        self.send_status = status;
        self.send_code = code;
        self.send_msg = msg.into();
        self
    }

    pub async fn start(self) -> MockServer {
        let state = Arc::new(MockState {
            behavior: self,
            calls: Mutex::new(Vec::new()),
            uploads: AtomicUsize::new(0),
            tokens: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route(TOKEN_ROUTE, post(token))
            .route(IMAGES_ROUTE, post(upload))
            .route(MESSAGES_ROUTE, post(send))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockServer {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
        }
    }
}

struct MockState {
    behavior: MockPlatform,
    calls: Mutex<Vec<RecordedCall>>,
    uploads: AtomicUsize,
    tokens: AtomicUsize,
}

impl MockState {
    fn record(&self, uri: &Uri, headers: &HeaderMap, body: Bytes) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        self.calls.lock().unwrap().push(RecordedCall {
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            authorization: header("authorization"),
            content_type: header("content-type"),
            body,
        });
    }
}

pub struct MockServer {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn count(&self, route: &str) -> usize {
        self.calls().iter().filter(|c| c.path == route).count()
    }

    pub fn calls_to(&self, route: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.path == route).collect()
    }

    /// The JSON body of the most recent delivery call.
    pub fn last_message(&self) -> Option<serde_json::Value> {
        self.calls_to(MESSAGES_ROUTE)
            .last()
            .map(|call| serde_json::from_slice(&call.body).unwrap())
    }
}

async fn token(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(&uri, &headers, body);
    let n = state.tokens.fetch_add(1, Ordering::SeqCst) + 1;
    let b = &state.behavior;

    let mut reply = json!({ "code": b.token_code, "msg": b.token_msg });
    if b.token_code == 0 {
        if !b.omit_token {
            reply["tenant_access_token"] = json!(format!("t-{n}"));
        }
        if let Some(expire) = b.token_expire {
            reply["expire"] = json!(expire);
        }
    }
    (b.token_status, axum::Json(reply)).into_response()
}

async fn upload(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(&uri, &headers, body);
    let n = state.uploads.fetch_add(1, Ordering::SeqCst) + 1;
    let b = &state.behavior;

    if !b.upload_status.is_success() {
        return (
            b.upload_status,
            axum::Json(json!({ "code": 99_991_663, "msg": "upload service unavailable" })),
        )
            .into_response();
    }
    if b.omit_image_key {
        return axum::Json(json!({ "code": 0, "msg": "success", "data": {} })).into_response();
    }
    if b.fail_upload_on == Some(n) {
        return axum::Json(json!({ "code": 234_011, "msg": "image upload rejected" }))
            .into_response();
    }

    axum::Json(json!({
        "code": 0,
        "msg": "success",
        "data": { "image_key": format!("img_v2_{n}") }
    }))
    .into_response()
}

async fn send(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(&uri, &headers, body);
    let b = &state.behavior;

    let mut reply = json!({ "code": b.send_code, "msg": b.send_msg });
    if b.send_code == 0 && !b.omit_send_data {
        reply["data"] = json!({
            "message_id": "om_mock_1",
            "chat_id": "oc_mock",
            "msg_type": "text",
            "create_time": "1700000000000"
        });
    }
    (b.send_status, axum::Json(reply)).into_response()
}
