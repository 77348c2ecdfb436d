mod lark;
mod registry;
mod server;


pub use lark::*;
pub use registry::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ServerError;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct LarkMsgConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bot registry backend configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Open platform connection settings.
    #[serde(default)]
    pub lark: LarkSection,
}

impl LarkMsgConfig {
    /// Load the configuration file at `path`, falling back to defaults when it
    /// does not exist, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let mut config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `LARK_*` overrides, reading variables through `lookup`.
    /// Empty values are ignored.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ServerError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(host) = var("LARK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("LARK_SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ServerError::Config(format!("invalid LARK_SERVER_PORT: {port}")))?;
        }
        if let Some(key) = var("LARK_API_KEY") {
            self.server.api_key = Some(key);
        }
        if let Some(path) = var("LARK_DB_PATH") {
            self.registry.path = path;
        }
        if let Some(key) = var("LARK_DB_KEY") {
            self.registry.key = Some(key);
        }
        if let Some(url) = var("LARK_BASE_URL") {
            self.lark.base_url = url;
        }
        Ok(())
    }
}
