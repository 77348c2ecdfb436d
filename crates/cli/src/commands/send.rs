use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;
use larkmsg_lark::{ImageAsset, MessagingClient, OutgoingMessage, ReceiveIdType, SentMessage};
use larkmsg_server::config::LarkMsgConfig;
use larkmsg_server::store_factory::create_bot_store;
use tracing::debug;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Name of the registered bot to send through.
    #[arg(short, long)]
    pub bot: String,
    /// Recipient identifier.
    #[arg(short, long)]
    pub to: String,
    /// Kind of recipient identifier (open_id, user_id, union_id, email, chat_id).
    #[arg(long, default_value = "open_id")]
    pub id_type: String,
    /// Post title.
    #[arg(long)]
    pub title: Option<String>,
    /// Message text.
    #[arg(short, long)]
    pub content: Option<String>,
    /// Image file to attach (repeatable).
    #[arg(short = 'i', long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,
}

/// Printed when the platform accepted a message without returning its ID.
const UNKNOWN_MESSAGE_ID: &str = "unknown";

fn display_message_id(sent: &SentMessage) -> &str {
    sent.message_id.as_deref().unwrap_or(UNKNOWN_MESSAGE_ID)
}

/// MIME type for an image file, judged by extension.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        _ => "image/png",
    }
}

async fn read_image(path: &Path) -> anyhow::Result<ImageAsset> {
    if !path.is_file() {
        bail!("image not found: {}", path.display());
    }
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image.png".to_owned(), |n| n.to_string_lossy().into_owned());

    debug!(path = %path.display(), bytes = data.len(), "image loaded");
    Ok(ImageAsset::new(data)
        .with_file_name(file_name)
        .with_content_type(content_type_for(path)))
}

async fn build_message(args: &SendArgs) -> anyhow::Result<OutgoingMessage> {
    let content = args.content.as_deref().filter(|c| !c.is_empty());
    if content.is_none() && args.images.is_empty() {
        bail!("nothing to send: pass --content and/or --image");
    }
    let receive_id_type: ReceiveIdType = args.id_type.parse()?;

    let mut message = OutgoingMessage::new(args.to.as_str()).with_receive_id_type(receive_id_type);
    if let Some(title) = args.title.as_deref().filter(|t| !t.is_empty()) {
        message = message.with_title(title);
    }
    if let Some(content) = content {
        message = message.with_content(content);
    }
    for path in &args.images {
        message = message.with_image(read_image(path).await?);
    }
    Ok(message)
}

pub async fn run(
    config: &LarkMsgConfig,
    args: &SendArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    // Validate inputs before the registry is opened.
    let message = build_message(args).await?;

    let store = create_bot_store(&config.registry).await?;
    let credential = store.lookup_credential(&args.bot).await?;
    let client = MessagingClient::new(credential, config.lark.client_config())?;

    let sent = client.send(&message).await?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "message_id": sent.message_id,
                "bot_name": args.bot,
                "receive_id": args.to,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("{}", display_message_id(&sent)),
    }
    Ok(())
}
