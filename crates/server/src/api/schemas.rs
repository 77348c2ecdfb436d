use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use larkmsg_registry::Bot;

use crate::error::ServerError;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Service name.
    #[schema(example = "larkmsg")]
    pub service: String,
}

/// Envelope for successful mutations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable outcome.
    #[schema(example = "bot created")]
    pub message: String,
    /// Operation-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Attach `data`, failing if it does not serialize to JSON.
    pub fn with_data(mut self, data: impl Serialize) -> Result<Self, ServerError> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }
}

/// Error envelope returned on failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Error message.
    #[schema(example = "bot not found: deploy-alerts")]
    pub message: String,
    /// Stable machine-readable error code.
    #[schema(example = "BOT_NOT_FOUND")]
    pub error_code: Option<String>,
}

/// Response for `GET /api/bots`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BotListResponse {
    /// Number of registered bots.
    pub total: usize,
    /// Registered bots, ordered by id. Secrets are never included.
    pub items: Vec<Bot>,
}

/// `data` of a successful `POST /api/send`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendResult {
    /// ID of the created message.
    #[schema(example = "om_dc13264520392913993dd051dba21dcf")]
    pub message_id: Option<String>,
    /// Bot that sent the message.
    #[schema(example = "deploy-alerts")]
    pub bot_name: String,
    /// Recipient the message was addressed to.
    #[schema(example = "ou_7d8a6e6df7621556ce0d21922b676706")]
    pub receive_id: String,
}

/// Multipart form accepted by `POST /api/send`.
#[derive(ToSchema)]
pub struct SendForm {
    /// Name of a registered, enabled bot.
    #[schema(example = "deploy-alerts")]
    pub bot_name: String,
    /// Recipient identifier.
    pub receive_id: String,
    /// One of `open_id`, `user_id`, `union_id`, `email`, `chat_id`.
    #[schema(example = "open_id")]
    pub receive_id_type: Option<String>,
    /// Post title. Forces a `post` message.
    pub title: Option<String>,
    /// Text content.
    pub content: Option<String>,
    /// Image files (binary), sent in order. Repeat the field for several
    /// images.
    #[schema(value_type = Vec<String>)]
    pub image: Vec<Vec<u8>>,
}
