use std::sync::Arc;

use tracing::info;

use larkmsg_registry::{BotStore, MemoryBotStore, SqliteBotStore};

use crate::config::RegistryConfig;
use crate::error::ServerError;

/// Create the bot store from the given configuration.
pub async fn create_bot_store(config: &RegistryConfig) -> Result<Arc<dyn BotStore>, ServerError> {
    let store: Arc<dyn BotStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryBotStore::new()),
        "sqlite" => Arc::new(SqliteBotStore::new(config.sqlite()).await?),
        other => {
            return Err(ServerError::Config(format!(
                "unsupported registry backend: {other} (expected \"sqlite\" or \"memory\")"
            )));
        }
    };

    info!(backend = %config.backend, "bot registry initialized");
    Ok(store)
}
