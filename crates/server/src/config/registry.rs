use std::fmt;

use serde::Deserialize;

use larkmsg_registry::SqliteConfig;

/// Configuration for the bot registry backend.
#[derive(Deserialize)]
pub struct RegistryConfig {
    /// Which backend to use: `"sqlite"` or `"memory"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// `SQLite` database file.
    #[serde(default = "default_path")]
    pub path: String,

    /// Optional SQLCipher key.
    #[serde(default)]
    pub key: Option<String>,
}

impl RegistryConfig {
    pub fn sqlite(&self) -> SqliteConfig {
        let config = SqliteConfig::new(&self.path);
        match &self.key {
            Some(key) => config.with_key(key),
            None => config,
        }
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field(
                "key",
                &self.key.as_ref().filter(|k| !k.is_empty()).map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_path(),
            key: None,
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_owned()
}

fn default_path() -> String {
    "data.db".to_owned()
}
