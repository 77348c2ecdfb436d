use std::time::Duration;

/// Default base URL of the Feishu open platform API.
pub const DEFAULT_API_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// App credentials of a self-built Lark / Feishu app.
///
/// Used to obtain a tenant access token. The secret never appears in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// App ID (`cli_...`).
    pub app_id: String,

    /// App secret paired with `app_id`.
    pub app_secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    /// Create a credential from an app ID and secret.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }
}

/// Transport settings shared by every [`MessagingClient`](crate::MessagingClient).
#[derive(Debug, Clone)]
pub struct LarkConfig {
    /// Base URL of the open platform API. Override this to target the
    /// international Lark host or a mock server.
    pub api_base_url: String,

    /// Per-request timeout applied to the HTTP client.
    pub timeout: Duration,
}

impl Default for LarkConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl LarkConfig {
    /// Override the API base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.api_base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the full URL for an API path such as `im/v1/images`.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base_url)
    }
}
