#![allow(clippy::needless_for_each)]

use larkmsg_registry::{Bot, NewBot};

use super::schemas::{
    BotListResponse, ErrorResponse, HealthResponse, SendForm, SendResult, SuccessResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "larkmsg API",
        version = "0.1.0",
        description = "Send text, image and post messages to Lark / Feishu through registered bots.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Bots", description = "Bot registry management"),
        (name = "Messages", description = "Message delivery")
    ),
    paths(
        super::health::health,
        super::bots::create_bot,
        super::bots::list_bots,
        super::bots::delete_bot,
        super::send::send_message,
    ),
    components(schemas(
        HealthResponse, SuccessResponse, ErrorResponse,
        Bot, NewBot, BotListResponse,
        SendForm, SendResult,
    ))
)]
pub struct ApiDoc;
