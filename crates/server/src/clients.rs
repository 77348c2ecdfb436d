use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Client;
use tracing::debug;

use larkmsg_lark::{Credential, LarkConfig, LarkError, MessagingClient};

/// One [`MessagingClient`] per bot, so each bot's tenant token survives
/// across requests.
///
/// All clients share a single HTTP connection pool. An entry is rebuilt when
/// the bot's stored credential no longer matches the cached one.
pub struct ClientPool {
    http: Client,
    config: LarkConfig,
    clients: DashMap<String, Arc<MessagingClient>>,
}

impl ClientPool {
    pub fn new(config: LarkConfig) -> Result<Self, LarkError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LarkError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            clients: DashMap::new(),
        })
    }

    /// The client for `bot`, creating it if needed.
    pub fn client_for(&self, bot: &str, credential: Credential) -> Arc<MessagingClient> {
        if let Some(existing) = self.clients.get(bot)
            && existing.credential() == &credential
        {
            return Arc::clone(existing.value());
        }

        debug!(bot, "creating messaging client");
        let client = Arc::new(MessagingClient::with_client(
            credential,
            self.config.clone(),
            self.http.clone(),
        ));
        self.clients.insert(bot.to_owned(), Arc::clone(&client));
        client
    }

    /// Drop the cached client for `bot`, if any.
    pub fn evict(&self, bot: &str) {
        if self.clients.remove(bot).is_some() {
            debug!(bot, "messaging client evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
