//! Message sending endpoint.

use axum::Json;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use tracing::{debug, info};

use larkmsg_lark::{ImageAsset, LarkError, OutgoingMessage, ReceiveIdType};
use larkmsg_registry::RegistryError;

use super::AppState;
use super::schemas::{ErrorResponse, SendForm, SendResult, SuccessResponse};
use crate::error::ServerError;

/// Fields collected from the multipart form.
#[derive(Debug, Default)]
struct SendFields {
    bot_name: Option<String>,
    receive_id: Option<String>,
    receive_id_type: Option<String>,
    title: Option<String>,
    content: Option<String>,
    images: Vec<ImageAsset>,
}

fn bad_multipart(e: MultipartError) -> ServerError {
    ServerError::BadRequest(format!("invalid multipart body: {}", e.body_text()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Title and content keep whitespace-only values; only empty ones are absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, ServerError> {
    non_empty(value).ok_or_else(|| ServerError::BadRequest(format!("{field} is required")))
}

async fn read_form(mut multipart: Multipart) -> Result<SendFields, ServerError> {
    let mut fields = SendFields::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field
                .content_type()
                .filter(|ct| ct.starts_with("image/"))
                .map(str::to_owned);
            let data = field.bytes().await.map_err(bad_multipart)?;
            // Browsers submit an empty part for an unused file input.
            if data.is_empty() {
                continue;
            }

            let mut image = ImageAsset::new(data.to_vec());
            if let Some(file_name) = file_name {
                image = image.with_file_name(file_name);
            }
            if let Some(content_type) = content_type {
                image = image.with_content_type(content_type);
            }
            fields.images.push(image);
            continue;
        }

        let slot = match name.as_str() {
            "bot_name" => &mut fields.bot_name,
            "receive_id" => &mut fields.receive_id,
            "receive_id_type" => &mut fields.receive_id_type,
            "title" => &mut fields.title,
            "content" => &mut fields.content,
            other => {
                debug!(field = other, "ignoring unknown form field");
                continue;
            }
        };
        *slot = Some(field.text().await.map_err(bad_multipart)?);
    }

    Ok(fields)
}

/// `POST /api/send` -- send a message through a registered bot.
#[utoipa::path(
    post,
    path = "/api/send",
    tag = "Messages",
    summary = "Send a message",
    description = "Sends a text, image or post message. The shape is picked from the inputs: content only is a text message, a single image with nothing else is an image message, anything else is a post with the text first and one row per image.",
    request_body(content = SendForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Message sent; `data` is a SendResult", body = SuccessResponse),
        (status = 400, description = "Missing content and images, or malformed form", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 404, description = "Bot unknown or disabled", body = ErrorResponse),
        (status = 502, description = "Token, upload or delivery call failed", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SuccessResponse>, ServerError> {
    let form = read_form(multipart).await?;

    let bot_name = required(form.bot_name, "bot_name")?;
    let receive_id = required(form.receive_id, "receive_id")?;
    let receive_id_type = match non_empty(form.receive_id_type) {
        Some(value) => value.trim().parse::<ReceiveIdType>()?,
        None => ReceiveIdType::default(),
    };
    let content = present(form.content);
    if content.is_none() && form.images.is_empty() {
        return Err(LarkError::Validation("content or images required".into()).into());
    }

    let credential = match state.store.lookup_credential(&bot_name).await {
        Ok(credential) => credential,
        Err(e) => {
            if matches!(e, RegistryError::Disabled(_)) {
                state.clients.evict(&bot_name);
            }
            return Err(e.into());
        }
    };
    let client = state.clients.client_for(&bot_name, credential);

    let message = OutgoingMessage {
        receive_id: receive_id.clone(),
        receive_id_type,
        title: present(form.title),
        content,
        images: form.images,
    };
    let sent = client.send(&message).await?;

    info!(bot = %bot_name, message_id = ?sent.message_id, "message sent via API");

    let result = SendResult {
        message_id: sent.message_id,
        bot_name,
        receive_id,
    };
    Ok(Json(SuccessResponse::new("message sent").with_data(result)?))
}
