pub mod bots;
pub mod health;
pub mod openapi;
pub mod schemas;
pub mod send;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use larkmsg_registry::BotStore;

use crate::auth::{self, ApiKey};
use crate::clients::ClientPool;

use self::openapi::ApiDoc;

/// Largest accepted `POST /api/send` body, images included.
pub const MAX_SEND_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bot registry.
    pub store: Arc<dyn BotStore>,
    /// Messaging clients, one per bot.
    pub clients: Arc<ClientPool>,
    /// Required API key (None when authentication is disabled).
    pub api_key: Option<Arc<ApiKey>>,
}

impl AppState {
    pub fn new(store: Arc<dyn BotStore>, clients: ClientPool) -> Self {
        Self {
            store,
            clients: Arc::new(clients),
            api_key: None,
        }
    }

    /// Require `key` on every `/api/*` route. `None` disables the check.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<&str>) -> Self {
        self.api_key = key.map(|k| Arc::new(ApiKey::new(k)));
        self
    }
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let public = Router::new().route("/health", get(health::health));

    let protected = Router::new()
        .route("/api/bots", get(bots::list_bots).post(bots::create_bot))
        .route("/api/bots/{id}", delete(bots::delete_bot))
        .route(
            "/api/send",
            post(send::send_message).layer(DefaultBodyLimit::max(MAX_SEND_BODY_BYTES)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
