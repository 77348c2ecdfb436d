//! Messaging client for the Lark / Feishu open platform.
//!
//! A [`MessagingClient`] sends messages on behalf of a single app. It caches
//! the tenant access token, uploads any images and picks the message shape
//! from the inputs:
//!
//! - content only: `text`
//! - a single image and nothing else: `image`
//! - anything else: `post`, with the text row first and one row per image
//!
//! # Quick start
//!
//! ```rust,no_run
//! use larkmsg_lark::{Credential, LarkConfig, MessagingClient, OutgoingMessage};
//!
//! # async fn demo() -> Result<(), larkmsg_lark::LarkError> {
//! let client = MessagingClient::new(
//!     Credential::new("cli_a1b2c3", "app-secret"),
//!     LarkConfig::default(),
//! )?;
//! let sent = client
//!     .send(&OutgoingMessage::new("ou_7d8a6e").with_content("deploy finished"))
//!     .await?;
//! println!("{:?}", sent.message_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod compose;
pub mod config;
pub mod error;
mod http;
pub mod token;
pub mod types;

#[cfg(test)]
mod mock_server;

pub use client::{MessagingClient, OutgoingMessage};
pub use compose::{ImageUploader, MessageComposer, MessageDraft, MessageShape, OutboundMessage};
pub use config::{Credential, DEFAULT_API_BASE_URL, LarkConfig};
pub use error::LarkError;
pub use token::{DEFAULT_TOKEN_TTL, TOKEN_SAFETY_MARGIN, TokenProvider};
pub use types::{ImageAsset, ReceiveIdType, SentMessage};
