use async_trait::async_trait;

use larkmsg_lark::Credential;

use crate::error::RegistryError;
use crate::model::{Bot, NewBot};

/// Trait for persisting registered bots.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait BotStore: Send + Sync {
    /// Validate and insert a new bot. Fails with
    /// [`RegistryError::Duplicate`] if the name is taken.
    async fn create(&self, bot: NewBot) -> Result<Bot, RegistryError>;

    /// All bots, ordered by id.
    async fn list(&self) -> Result<Vec<Bot>, RegistryError>;

    async fn get(&self, id: i64) -> Result<Option<Bot>, RegistryError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Bot>, RegistryError>;

    /// Remove a bot by id and return it.
    async fn delete(&self, id: i64) -> Result<Bot, RegistryError>;

    /// Remove a bot by name and return it.
    async fn delete_by_name(&self, name: &str) -> Result<Bot, RegistryError>;

    /// Enable or disable a bot, bumping `updated_at`.
    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<Bot, RegistryError>;

    /// Resolve a bot name into the credential used for sending.
    ///
    /// Missing bots yield [`RegistryError::NotFound`], disabled ones
    /// [`RegistryError::Disabled`].
    async fn lookup_credential(&self, name: &str) -> Result<Credential, RegistryError> {
        let bot = self
            .get_by_name(name)
            .await?
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))?;
        if !bot.enabled {
            return Err(RegistryError::Disabled(name.to_owned()));
        }
        Ok(bot.credential())
    }
}
