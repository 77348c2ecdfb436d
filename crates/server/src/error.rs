use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use larkmsg_lark::LarkError;
use larkmsg_registry::RegistryError;

use crate::api::schemas::ErrorResponse;

/// Errors that can occur when running the server or handling a request.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request itself is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid API key.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A response payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A registry-level error surfaced through the API.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A messaging error surfaced through the API.
    #[error(transparent)]
    Messaging(#[from] LarkError),
}

impl ServerError {
    /// HTTP status and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Io(_) | Self::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Registry(e) => match e {
                RegistryError::Duplicate(_) => (StatusCode::BAD_REQUEST, "BOT_EXISTS"),
                RegistryError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "BOT_NOT_FOUND"),
                RegistryError::Disabled(_) => (StatusCode::NOT_FOUND, "BOT_DISABLED"),
                RegistryError::Connection(_) | RegistryError::Backend(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "REGISTRY_ERROR")
                }
            },
            Self::Messaging(e) => match e {
                LarkError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                LarkError::Auth(_) => (StatusCode::BAD_GATEWAY, "AUTH_ERROR"),
                LarkError::Upload(_) => (StatusCode::BAD_GATEWAY, "UPLOAD_ERROR"),
                LarkError::Delivery(_) => (StatusCode::BAD_GATEWAY, "DELIVERY_ERROR"),
                LarkError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            warn!(%status, error_code = code, error = %self, "request failed");
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
            error_code: Some(code.to_owned()),
        };
        (status, axum::Json(body)).into_response()
    }
}
