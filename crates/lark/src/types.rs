use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LarkError;

/// Request body for `auth/v3/tenant_access_token/internal`.
#[derive(Debug, Serialize)]
pub(crate) struct TenantTokenRequest<'a> {
    pub app_id: &'a str,
    pub app_secret: &'a str,
}

/// Response from `auth/v3/tenant_access_token/internal`.
///
/// Unlike the other endpoints the token fields sit at the top level rather
/// than under `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct TenantTokenResponse {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub tenant_access_token: Option<String>,
    /// Token lifetime in seconds.
    pub expire: Option<u64>,
}

impl TenantTokenResponse {
    pub fn is_ok(&self) -> bool {
        self.code == Some(0)
    }

    pub fn error_message(&self) -> String {
        platform_message(self.code, self.msg.as_deref())
    }
}

/// Envelope shared by the `im/v1` endpoints: `{code, msg, data}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.code == Some(0)
    }

    pub fn error_message(&self) -> String {
        platform_message(self.code, self.msg.as_deref())
    }
}

/// `data` of a successful `im/v1/images` upload.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadedImage {
    pub image_key: Option<String>,
}

/// Request body for `im/v1/messages`.
#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub receive_id: &'a str,
    pub msg_type: &'static str,
    /// The message body, serialized to a JSON string.
    pub content: String,
}

/// `data` of a successful `im/v1/messages` call.
///
/// Only the fields callers care about are kept; all of them are optional
/// because the platform does not guarantee their presence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// ID of the created message (`om_...`). `None` when the platform
    /// accepted the message but answered without a `data` object.
    pub message_id: Option<String>,
    /// Chat the message landed in.
    pub chat_id: Option<String>,
    /// Message type echoed back by the platform.
    pub msg_type: Option<String>,
    /// Creation time in milliseconds since the epoch, as a string.
    pub create_time: Option<String>,
}

fn platform_message(code: Option<i64>, msg: Option<&str>) -> String {
    match (code, msg) {
        (_, Some(msg)) if !msg.is_empty() => msg.to_owned(),
        (Some(code), _) => format!("code {code}"),
        (None, _) => "response carried no status code".to_owned(),
    }
}

/// Kind of identifier carried in `receive_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveIdType {
    #[default]
    OpenId,
    UserId,
    UnionId,
    Email,
    ChatId,
}

impl ReceiveIdType {
    /// Wire name used in the `receive_id_type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenId => "open_id",
            Self::UserId => "user_id",
            Self::UnionId => "union_id",
            Self::Email => "email",
            Self::ChatId => "chat_id",
        }
    }
}

impl fmt::Display for ReceiveIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceiveIdType {
    type Err = LarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open_id" => Ok(Self::OpenId),
            "user_id" => Ok(Self::UserId),
            "union_id" => Ok(Self::UnionId),
            "email" => Ok(Self::Email),
            "chat_id" => Ok(Self::ChatId),
            other => Err(LarkError::Validation(format!(
                "unsupported receive_id_type '{other}', expected one of open_id, user_id, union_id, email, chat_id"
            ))),
        }
    }
}

/// An image supplied by the caller for a single send.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Raw image bytes. Must not be empty.
    pub data: Vec<u8>,
    /// File name reported in the multipart upload.
    pub file_name: String,
    /// MIME type reported in the multipart upload.
    pub content_type: String,
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("len", &self.data.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl ImageAsset {
    /// Wrap raw bytes as `image.png` / `image/png`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            file_name: "image.png".to_owned(),
            content_type: "image/png".to_owned(),
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
