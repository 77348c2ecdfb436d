use std::future::Future;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::LarkError;
use crate::types::ImageAsset;

/// Locale key wrapping every post body.
pub const POST_LOCALE: &str = "zh_cn";

/// Wire shape of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageShape {
    /// Plain text: `{"text": ...}`.
    Text,
    /// A single image: `{"image_key": ...}`.
    Image,
    /// Rich post with a title and ordered text/image rows.
    Post,
}

impl MessageShape {
    /// Pick the shape for the given inputs. Precedence:
    ///
    /// 1. exactly one image and nothing else: [`Image`](Self::Image)
    /// 2. content only: [`Text`](Self::Text)
    /// 3. everything else: [`Post`](Self::Post)
    pub fn classify(title: Option<&str>, content: Option<&str>, image_count: usize) -> Self {
        match (title, content, image_count) {
            (None, None, 1) => Self::Image,
            (None, Some(_), 0) => Self::Text,
            _ => Self::Post,
        }
    }

    /// The `msg_type` value sent to the platform.
    pub fn msg_type(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Post => "post",
        }
    }
}

/// One element of a post row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum PostElement {
    Text { text: String },
    Img { image_key: String },
}

/// A fully composed message, ready to be serialized into the `content`
/// field of the delivery request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    shape: MessageShape,
    body: serde_json::Value,
}

impl OutboundMessage {
    pub fn shape(&self) -> MessageShape {
        self.shape
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// The body as the JSON string the platform expects in `content`.
    pub fn content_string(&self) -> String {
        self.body.to_string()
    }
}

/// The message inputs of a single send, with empty strings already treated
/// as absent.
#[derive(Debug, Clone, Copy)]
pub struct MessageDraft<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub images: &'a [ImageAsset],
}

impl<'a> MessageDraft<'a> {
    pub fn new(title: Option<&'a str>, content: Option<&'a str>, images: &'a [ImageAsset]) -> Self {
        Self {
            title: title.filter(|t| !t.is_empty()),
            content: content.filter(|c| !c.is_empty()),
            images,
        }
    }

    /// Check the inputs before anything touches the network.
    pub fn validate(&self) -> Result<(), LarkError> {
        if self.content.is_none() && self.images.is_empty() {
            return Err(LarkError::Validation("content or images required".into()));
        }
        if let Some(index) = self.images.iter().position(ImageAsset::is_empty) {
            return Err(LarkError::Validation(format!("image #{} is empty", index + 1)));
        }
        Ok(())
    }

    pub fn shape(&self) -> MessageShape {
        MessageShape::classify(self.title, self.content, self.images.len())
    }
}

/// Something that can turn image bytes into an opaque `image_key`.
pub trait ImageUploader: Send + Sync {
    fn upload_image(
        &self,
        image: &ImageAsset,
    ) -> impl Future<Output = Result<String, LarkError>> + Send;
}

/// Builds the wire body for a draft, uploading images first.
///
/// Uploads run one at a time in input order. The first failed upload aborts
/// composition; no partial body is ever produced.
pub struct MessageComposer<'u, U> {
    uploader: &'u U,
}

impl<'u, U: ImageUploader> MessageComposer<'u, U> {
    pub fn new(uploader: &'u U) -> Self {
        Self { uploader }
    }

    pub async fn compose(&self, draft: &MessageDraft<'_>) -> Result<OutboundMessage, LarkError> {
        let shape = draft.shape();
        let body = match (shape, draft.images) {
            (MessageShape::Image, [image]) => {
                let image_key = self.uploader.upload_image(image).await?;
                json!({ "image_key": image_key })
            }
            (MessageShape::Text, _) => json!({ "text": draft.content.unwrap_or_default() }),
            _ => self.compose_post(draft).await?,
        };

        debug!(msg_type = shape.msg_type(), "message composed");
        Ok(OutboundMessage { shape, body })
    }

    async fn compose_post(&self, draft: &MessageDraft<'_>) -> Result<serde_json::Value, LarkError> {
        let mut rows: Vec<Vec<PostElement>> = Vec::with_capacity(draft.images.len() + 1);

        if let Some(text) = draft.content {
            rows.push(vec![PostElement::Text {
                text: text.to_owned(),
            }]);
        }

        for (index, image) in draft.images.iter().enumerate() {
            let image_key = self.uploader.upload_image(image).await?;
            debug!(index, "post image uploaded");
            rows.push(vec![PostElement::Img { image_key }]);
        }

        Ok(json!({
            POST_LOCALE: {
                "title": draft.title.unwrap_or_default(),
                "content": rows,
            }
        }))
    }
}
