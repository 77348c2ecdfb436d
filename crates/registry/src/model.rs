use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use larkmsg_lark::Credential;

use crate::error::RegistryError;

/// Longest accepted bot name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// A registered bot: a named set of app credentials.
///
/// `app_secret` is never serialized and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Bot {
    /// Store-assigned identifier.
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub id: i64,
    /// Unique name used to address the bot.
    #[cfg_attr(feature = "openapi", schema(example = "deploy-alerts"))]
    pub name: String,
    /// Platform app ID.
    #[cfg_attr(feature = "openapi", schema(example = "cli_a1b2c3d4e5f6"))]
    pub app_id: String,
    #[serde(skip_serializing)]
    pub app_secret: String,
    /// Disabled bots stay registered but cannot send.
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Bot {
    /// The credential used to obtain tenant tokens for this bot.
    pub fn credential(&self) -> Credential {
        Credential::new(self.app_id.clone(), self.app_secret.clone())
    }
}

/// Input for [`BotStore::create`](crate::BotStore::create).
#[derive(Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewBot {
    #[cfg_attr(feature = "openapi", schema(example = "deploy-alerts"))]
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(example = "cli_a1b2c3d4e5f6"))]
    pub app_id: String,
    pub app_secret: String,
}

impl fmt::Debug for NewBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewBot")
            .field("name", &self.name)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

impl NewBot {
    pub fn new(
        name: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Trim surrounding whitespace and check required fields.
    pub fn validate(self) -> Result<Self, RegistryError> {
        let name = self.name.trim().to_owned();
        let app_id = self.app_id.trim().to_owned();
        let app_secret = self.app_secret.trim().to_owned();

        if name.is_empty() {
            return Err(RegistryError::InvalidInput("name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(RegistryError::InvalidInput(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if app_id.is_empty() {
            return Err(RegistryError::InvalidInput("app_id is required".into()));
        }
        if app_secret.is_empty() {
            return Err(RegistryError::InvalidInput("app_secret is required".into()));
        }

        Ok(Self {
            name,
            app_id,
            app_secret,
        })
    }
}
