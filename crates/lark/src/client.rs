use std::sync::Arc;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

use crate::compose::{ImageUploader, MessageComposer, MessageDraft, OutboundMessage};
use crate::config::{Credential, LarkConfig};
use crate::error::LarkError;
use crate::http::describe_http_failure;
use crate::token::TokenProvider;
use crate::types::{
    ApiResponse, ImageAsset, ReceiveIdType, SendMessageRequest, SentMessage, UploadedImage,
};

const IMAGES_PATH: &str = "im/v1/images";
const MESSAGES_PATH: &str = "im/v1/messages";

/// `image_type` declared for every upload.
const IMAGE_TYPE_MESSAGE: &str = "message";

/// A message to deliver through [`MessagingClient::send`].
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub receive_id: String,
    pub receive_id_type: ReceiveIdType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub images: Vec<ImageAsset>,
}

impl OutgoingMessage {
    /// Address a message to `receive_id`, interpreted as an `open_id`.
    pub fn new(receive_id: impl Into<String>) -> Self {
        Self {
            receive_id: receive_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_receive_id_type(mut self, receive_id_type: ReceiveIdType) -> Self {
        self.receive_id_type = receive_id_type;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageAsset) -> Self {
        self.images.push(image);
        self
    }
}

/// Sends text, image and post messages on behalf of one app.
///
/// A send runs strictly in sequence: fetch (or reuse) the tenant token,
/// upload each image in input order, compose the body, deliver. The first
/// failing step ends the send with that step's error. Nothing is retried.
pub struct MessagingClient {
    client: Client,
    config: Arc<LarkConfig>,
    tokens: TokenProvider,
}

impl MessagingClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(credential: Credential, config: LarkConfig) -> Result<Self, LarkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LarkError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(credential, config, client))
    }

    /// Create a client on top of an existing HTTP client, sharing its
    /// connection pool.
    pub fn with_client(credential: Credential, config: LarkConfig, client: Client) -> Self {
        let config = Arc::new(config);
        let tokens = TokenProvider::new(client.clone(), Arc::clone(&config), credential);
        Self {
            client,
            config,
            tokens,
        }
    }

    pub fn credential(&self) -> &Credential {
        self.tokens.credential()
    }

    /// Current tenant access token, refreshed if needed.
    pub async fn tenant_access_token(&self) -> Result<String, LarkError> {
        self.tokens.get_token().await
    }

    /// Upload a single image and return its `image_key`.
    pub async fn upload_image(&self, image: &ImageAsset) -> Result<String, LarkError> {
        if image.is_empty() {
            return Err(LarkError::Validation("image is empty".into()));
        }
        let token = self.tokens.get_token().await?;
        self.uploader(&token).upload_image(image).await
    }

    /// Compose and deliver a message.
    #[instrument(
        skip(self, message),
        fields(
            app_id = %self.credential().app_id,
            receive_id_type = %message.receive_id_type,
            images = message.images.len(),
        )
    )]
    pub async fn send(&self, message: &OutgoingMessage) -> Result<SentMessage, LarkError> {
        let draft = MessageDraft::new(
            message.title.as_deref(),
            message.content.as_deref(),
            &message.images,
        );
        draft.validate()?;
        if message.receive_id.is_empty() {
            return Err(LarkError::Validation("receive_id required".into()));
        }

        let token = self.tokens.get_token().await?;
        let uploader = self.uploader(&token);
        let outbound = MessageComposer::new(&uploader).compose(&draft).await?;

        self.deliver(&token, message, &outbound).await
    }

    fn uploader<'a>(&'a self, token: &'a str) -> AssetUploader<'a> {
        AssetUploader {
            client: &self.client,
            config: &self.config,
            token,
        }
    }

    async fn deliver(
        &self,
        token: &str,
        message: &OutgoingMessage,
        outbound: &OutboundMessage,
    ) -> Result<SentMessage, LarkError> {
        let url = format!(
            "{}?receive_id_type={}",
            self.config.api_url(MESSAGES_PATH),
            message.receive_id_type.as_str()
        );
        let request = SendMessageRequest {
            receive_id: &message.receive_id,
            msg_type: outbound.shape().msg_type(),
            content: outbound.content_string(),
        };

        debug!(msg_type = request.msg_type, "delivering message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| LarkError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_http_failure(status, &body);
            warn!(%status, error = %message, "message delivery failed");
            return Err(LarkError::Delivery(message));
        }

        let body: ApiResponse<SentMessage> = response
            .json()
            .await
            .map_err(|e| LarkError::Delivery(format!("malformed send response: {e}")))?;

        if !body.is_ok() {
            let message = body.error_message();
            warn!(code = ?body.code, error = %message, "message rejected by platform");
            return Err(LarkError::Delivery(message));
        }

        let sent = body.data.unwrap_or_default();
        info!(
            message_id = sent.message_id.as_deref().unwrap_or("unknown"),
            msg_type = request.msg_type,
            "message sent"
        );
        Ok(sent)
    }
}

/// Uploads images with an already obtained token.
struct AssetUploader<'a> {
    client: &'a Client,
    config: &'a LarkConfig,
    token: &'a str,
}

impl ImageUploader for AssetUploader<'_> {
    async fn upload_image(&self, image: &ImageAsset) -> Result<String, LarkError> {
        let url = self.config.api_url(IMAGES_PATH);

        let part = Part::bytes(image.data.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| {
                LarkError::Upload(format!("invalid content type '{}': {e}", image.content_type))
            })?;
        let form = Form::new()
            .text("image_type", IMAGE_TYPE_MESSAGE)
            .part("image", part);

        debug!(bytes = image.data.len(), file_name = %image.file_name, "uploading image");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LarkError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LarkError::Upload(describe_http_failure(status, &body)));
        }

        let body: ApiResponse<UploadedImage> = response
            .json()
            .await
            .map_err(|e| LarkError::Upload(format!("malformed upload response: {e}")))?;

        if !body.is_ok() {
            let message = body.error_message();
            warn!(code = ?body.code, error = %message, "image upload rejected");
            return Err(LarkError::Upload(message));
        }

        body.data
            .and_then(|data| data.image_key)
            .ok_or_else(|| LarkError::Upload("response missing image_key".into()))
    }
}
