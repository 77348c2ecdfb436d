use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::RegistryError;
use crate::model::{Bot, NewBot};
use crate::store::BotStore;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    bots: BTreeMap<i64, Bot>,
}

impl Inner {
    fn id_of(&self, name: &str) -> Option<i64> {
        self.bots
            .values()
            .find(|bot| bot.name == name)
            .map(|bot| bot.id)
    }
}

/// In-memory [`BotStore`]. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBotStore {
    inner: RwLock<Inner>,
}

impl MemoryBotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BotStore for MemoryBotStore {
    async fn create(&self, bot: NewBot) -> Result<Bot, RegistryError> {
        let bot = bot.validate()?;
        let mut inner = self.inner.write().await;

        if inner.id_of(&bot.name).is_some() {
            return Err(RegistryError::Duplicate(bot.name));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let created = Bot {
            id: inner.next_id,
            name: bot.name,
            app_id: bot.app_id,
            app_secret: bot.app_secret,
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        inner.bots.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Bot>, RegistryError> {
        Ok(self.inner.read().await.bots.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Bot>, RegistryError> {
        Ok(self.inner.read().await.bots.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Bot>, RegistryError> {
        let inner = self.inner.read().await;
        Ok(inner.id_of(name).and_then(|id| inner.bots.get(&id).cloned()))
    }

    async fn delete(&self, id: i64) -> Result<Bot, RegistryError> {
        self.inner
            .write()
            .await
            .bots
            .remove(&id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn delete_by_name(&self, name: &str) -> Result<Bot, RegistryError> {
        let mut inner = self.inner.write().await;
        inner
            .id_of(name)
            .and_then(|id| inner.bots.remove(&id))
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<Bot, RegistryError> {
        let mut inner = self.inner.write().await;
        let id = inner
            .id_of(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))?;
        let bot = inner
            .bots
            .get_mut(&id)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))?;
        bot.enabled = enabled;
        bot.updated_at = Utc::now();
        Ok(bot.clone())
    }
}
