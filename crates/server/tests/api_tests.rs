use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{self, Request, StatusCode, Uri};
use axum::routing::post;
use serde_json::{Value, json};
use tower::ServiceExt;

use larkmsg_lark::LarkConfig;
use larkmsg_registry::{BotStore, MemoryBotStore, NewBot};
use larkmsg_server::api::AppState;
use larkmsg_server::clients::ClientPool;

// -- Mock platform --------------------------------------------------------

#[derive(Default)]
struct Platform {
    tokens: AtomicUsize,
    uploads: AtomicUsize,
    /// (path, body) in arrival order.
    calls: Mutex<Vec<(String, Bytes)>>,
    reject_send: bool,
}

impl Platform {
    fn count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    fn last_message(&self) -> Value {
        let calls = self.calls.lock().unwrap();
        let (_, body) = calls
            .iter()
            .rev()
            .find(|(p, _)| p == "/im/v1/messages")
            .expect("no message delivered");
        serde_json::from_slice(body).unwrap()
    }
}

async fn platform_handler(
    State(platform): State<Arc<Platform>>,
    uri: Uri,
    body: Bytes,
) -> axum::Json<Value> {
    let path = uri.path().to_owned();
    platform.calls.lock().unwrap().push((path.clone(), body));

    let reply = match path.as_str() {
        "/auth/v3/tenant_access_token/internal" => {
            let n = platform.tokens.fetch_add(1, Ordering::SeqCst) + 1;
            json!({ "code": 0, "msg": "ok", "tenant_access_token": format!("t-{n}"), "expire": 7200 })
        }
        "/im/v1/images" => {
            let n = platform.uploads.fetch_add(1, Ordering::SeqCst) + 1;
            json!({ "code": 0, "msg": "success", "data": { "image_key": format!("img_{n}") } })
        }
        _ if platform.reject_send => json!({ "code": 230_002, "msg": "bot is not in the chat" }),
        _ => json!({ "code": 0, "msg": "success", "data": { "message_id": "om_test_1" } }),
    };
    axum::Json(reply)
}

async fn start_platform(platform: Arc<Platform>) -> String {
    let app = axum::Router::new()
        .route("/auth/v3/tenant_access_token/internal", post(platform_handler))
        .route("/im/v1/images", post(platform_handler))
        .route("/im/v1/messages", post(platform_handler))
        .with_state(platform);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

// -- Helpers --------------------------------------------------------------

struct TestApp {
    router: axum::Router,
    store: Arc<MemoryBotStore>,
}

fn build_app(base_url: &str, api_key: Option<&str>) -> TestApp {
    let store = Arc::new(MemoryBotStore::new());
    let clients =
        ClientPool::new(LarkConfig::default().with_api_base_url(base_url)).expect("client pool");
    let state = AppState::new(Arc::clone(&store) as Arc<dyn BotStore>, clients).with_api_key(api_key);
    TestApp {
        router: larkmsg_server::api::router(state),
        store,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: http::Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "larkmsg-test-boundary";

/// Build a `multipart/form-data` request for `/api/send`.
fn send_request(fields: &[(&str, &str)], images: &[&[u8]]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (i, data) in images.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"shot{i}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(http::Method::POST)
        .uri("/api/send")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn register(store: &MemoryBotStore, name: &str) {
    store
        .create(NewBot::new(name, "cli_test", "secret"))
        .await
        .unwrap();
}

// -- Health & docs --------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = build_app("http://127.0.0.1:1", None);

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "larkmsg");
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = build_app("http://127.0.0.1:1", None);

    let response = app
        .router
        .oneshot(get("/api-doc/openapi.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/api/send"].is_object());
    assert!(json["paths"]["/api/bots"].is_object());
}

// -- Bots -----------------------------------------------------------------

#[tokio::test]
async fn create_bot_hides_secret() {
    let app = build_app("http://127.0.0.1:1", None);

    let response = app
        .router
        .oneshot(json_request(
            http::Method::POST,
            "/api/bots",
            &json!({ "name": "ops", "app_id": "cli_1", "app_secret": "shh" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["name"], "ops");
    assert_eq!(json["data"]["enabled"], true);
    assert!(json["data"].get("app_secret").is_none());
}

#[tokio::test]
async fn duplicate_bot_is_400() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(json_request(
            http::Method::POST,
            "/api/bots",
            &json!({ "name": "ops", "app_id": "cli_2", "app_secret": "x" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error_code"], "BOT_EXISTS");
}

#[tokio::test]
async fn blank_bot_name_is_400() {
    let app = build_app("http://127.0.0.1:1", None);

    let response = app
        .router
        .oneshot(json_request(
            http::Method::POST,
            "/api/bots",
            &json!({ "name": "  ", "app_id": "cli_2", "app_secret": "x" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_bots_returns_total_and_items() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "alpha").await;
    register(&app.store, "beta").await;

    let response = app.router.oneshot(get("/api/bots")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["items"][0]["name"], "alpha");
    assert_eq!(json["items"][1]["name"], "beta");
}

#[tokio::test]
async fn delete_bot_by_id() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "ops").await;
    let id = app.store.get_by_name("ops").await.unwrap().unwrap().id;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(http::Method::DELETE)
                .uri(format!("/api/bots/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.store.list().await.unwrap().is_empty());

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method(http::Method::DELETE)
                .uri(format!("/api/bots/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error_code"], "BOT_NOT_FOUND");
}

// -- Send -----------------------------------------------------------------

#[tokio::test]
async fn send_text_message() {
    let platform = Arc::new(Platform::default());
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "hi")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["message_id"], "om_test_1");
    assert_eq!(json["data"]["bot_name"], "ops");
    assert_eq!(json["data"]["receive_id"], "ou_1");

    let message = platform.last_message();
    assert_eq!(message["msg_type"], "text");
    assert_eq!(message["content"], r#"{"text":"hi"}"#);
}

#[tokio::test]
async fn whitespace_title_still_makes_a_post() {
    let platform = Arc::new(Platform::default());
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[
                ("bot_name", "ops"),
                ("receive_id", "ou_1"),
                ("title", " "),
                ("content", "hi"),
            ],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let message = platform.last_message();
    assert_eq!(message["msg_type"], "post");
    let content: Value = serde_json::from_str(message["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["zh_cn"]["title"], " ");
}

#[tokio::test]
async fn whitespace_content_is_sent_as_text() {
    let platform = Arc::new(Platform::default());
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "   ")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let message = platform.last_message();
    assert_eq!(message["msg_type"], "text");
    assert_eq!(message["content"], r#"{"text":"   "}"#);
}

#[tokio::test]
async fn send_with_images_builds_post() {
    let platform = Arc::new(Platform::default());
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[
                ("bot_name", "ops"),
                ("receive_id", "oc_1"),
                ("receive_id_type", "chat_id"),
                ("title", "Report"),
                ("content", "numbers attached"),
            ],
            &[b"png-one", b"png-two"],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(platform.count("/im/v1/images"), 2);

    let message = platform.last_message();
    assert_eq!(message["msg_type"], "post");
    let content: Value = serde_json::from_str(message["content"].as_str().unwrap()).unwrap();
    assert_eq!(content["zh_cn"]["title"], "Report");
    assert_eq!(
        content["zh_cn"]["content"],
        json!([
            [{ "tag": "text", "text": "numbers attached" }],
            [{ "tag": "img", "image_key": "img_1" }],
            [{ "tag": "img", "image_key": "img_2" }],
        ])
    );
}

#[tokio::test]
async fn empty_image_parts_are_dropped() {
    let platform = Arc::new(Platform::default());
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "hi")],
            &[b""],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(platform.count("/im/v1/images"), 0);
    assert_eq!(platform.last_message()["msg_type"], "text");
}

#[tokio::test]
async fn bot_client_is_reused_across_requests() {
    let platform = Arc::new(Platform::default());
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(send_request(
                &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "hi")],
                &[],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(platform.count("/auth/v3/tenant_access_token/internal"), 1);
    assert_eq!(platform.count("/im/v1/messages"), 2);
}

#[tokio::test]
async fn send_without_content_or_images_is_400() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("title", "t")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "VALIDATION_ERROR");
    assert_eq!(json["message"], "content or images required");
}

#[tokio::test]
async fn send_with_unknown_receive_id_type_is_400() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[
                ("bot_name", "ops"),
                ("receive_id", "ou_1"),
                ("receive_id_type", "phone"),
                ("content", "hi"),
            ],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_via_unknown_bot_is_404() {
    let app = build_app("http://127.0.0.1:1", None);

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ghost"), ("receive_id", "ou_1"), ("content", "hi")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error_code"], "BOT_NOT_FOUND");
}

#[tokio::test]
async fn send_via_disabled_bot_is_404() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "ops").await;
    app.store.set_enabled("ops", false).await.unwrap();

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "hi")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error_code"], "BOT_DISABLED");
}

#[tokio::test]
async fn platform_rejection_is_502() {
    let platform = Arc::new(Platform {
        reject_send: true,
        ..Platform::default()
    });
    let base_url = start_platform(Arc::clone(&platform)).await;
    let app = build_app(&base_url, None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "hi")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "DELIVERY_ERROR");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("bot is not in the chat")
    );
}

#[tokio::test]
async fn unreachable_platform_is_auth_error() {
    let app = build_app("http://127.0.0.1:1", None);
    register(&app.store, "ops").await;

    let response = app
        .router
        .oneshot(send_request(
            &[("bot_name", "ops"), ("receive_id", "ou_1"), ("content", "hi")],
            &[],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error_code"], "AUTH_ERROR");
}

// -- API key --------------------------------------------------------------

#[tokio::test]
async fn api_key_required_when_configured() {
    let app = build_app("http://127.0.0.1:1", Some("k-123"));

    let response = app.router.clone().oneshot(get("/api/bots")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error_code"], "UNAUTHORIZED");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bots")
                .header("x-api-key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bots")
                .header("x-api-key", "k-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/bots")
                .header("authorization", "Bearer k-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays public.
    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
