//! Bot registry endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use larkmsg_registry::{Bot, NewBot, RegistryError};

use super::AppState;
use super::schemas::{BotListResponse, ErrorResponse, SuccessResponse};
use crate::error::ServerError;

/// `POST /api/bots` -- register a bot.
#[utoipa::path(
    post,
    path = "/api/bots",
    tag = "Bots",
    summary = "Register a bot",
    description = "Stores a named app credential pair. Names are unique.",
    request_body(content = NewBot, description = "Bot name and app credentials"),
    responses(
        (status = 200, description = "Bot created; `data` holds the bot", body = SuccessResponse),
        (status = 400, description = "Invalid input or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
    )
)]
pub async fn create_bot(
    State(state): State<AppState>,
    Json(req): Json<NewBot>,
) -> Result<impl IntoResponse, ServerError> {
    let bot = state.store.create(req).await?;
    info!(bot = %bot.name, id = bot.id, "bot registered");

    let body = SuccessResponse::new("bot created").with_data(&bot)?;
    Ok((StatusCode::OK, Json(body)))
}

/// `GET /api/bots` -- list bots.
#[utoipa::path(
    get,
    path = "/api/bots",
    tag = "Bots",
    summary = "List bots",
    description = "Returns every registered bot, ordered by id. Secrets are never returned.",
    responses(
        (status = 200, description = "Registered bots", body = BotListResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
    )
)]
pub async fn list_bots(State(state): State<AppState>) -> Result<Json<BotListResponse>, ServerError> {
    let items: Vec<Bot> = state.store.list().await?;
    Ok(Json(BotListResponse {
        total: items.len(),
        items,
    }))
}

/// `DELETE /api/bots/{id}` -- remove a bot.
#[utoipa::path(
    delete,
    path = "/api/bots/{id}",
    tag = "Bots",
    summary = "Delete a bot",
    params(("id" = i64, Path, description = "Bot id")),
    responses(
        (status = 200, description = "Bot deleted", body = SuccessResponse),
        (status = 404, description = "No bot with this id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
    )
)]
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let bot = state.store.delete(id).await.map_err(|e| match e {
        RegistryError::NotFound(_) => RegistryError::NotFound(format!("id={id}")),
        other => other,
    })?;
    state.clients.evict(&bot.name);
    info!(bot = %bot.name, id, "bot deleted");

    Ok(Json(SuccessResponse::new(format!("bot '{}' deleted", bot.name))))
}
