use std::time::Duration;

use serde::Deserialize;

use larkmsg_lark::{DEFAULT_API_BASE_URL, LarkConfig};

/// Open platform connection settings.
#[derive(Debug, Deserialize)]
pub struct LarkSection {
    /// Base URL of the open platform API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl LarkSection {
    pub fn client_config(&self) -> LarkConfig {
        LarkConfig::default()
            .with_api_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
    }
}

impl Default for LarkSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_owned()
}

fn default_timeout() -> u64 {
    30
}
