use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::{Credential, LarkConfig};
use crate::error::LarkError;
use crate::http::describe_http_failure;
use crate::types::{TenantTokenRequest, TenantTokenResponse};

/// A cached token is only handed out while it has more than this much life
/// left.
pub const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(300);

/// Lifetime assumed when the platform omits `expire`.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7200);

const TOKEN_PATH: &str = "auth/v3/tenant_access_token/internal";

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_usable(&self, now: Instant) -> bool {
        now + TOKEN_SAFETY_MARGIN < self.expires_at
    }
}

/// Obtains and caches the tenant access token for one credential.
///
/// The cache slot is replaced wholesale on refresh. Two sends racing on an
/// expired slot may both fetch a token; the later write wins and both
/// tokens stay valid on the platform side.
pub struct TokenProvider {
    client: Client,
    config: Arc<LarkConfig>,
    credential: Credential,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub(crate) fn new(client: Client, config: Arc<LarkConfig>, credential: Credential) -> Self {
        Self {
            client,
            config,
            credential,
            cache: RwLock::new(None),
        }
    }

    /// The credential this provider fetches tokens for.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Return a usable token, fetching a new one only when the cached token
    /// is missing or within [`TOKEN_SAFETY_MARGIN`] of expiry.
    pub async fn get_token(&self) -> Result<String, LarkError> {
        if let Some(token) = self.cached(Instant::now()).await {
            return Ok(token);
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *self.cache.write().await = Some(fresh);
        Ok(token)
    }

    async fn cached(&self, now: Instant) -> Option<String> {
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.is_usable(now))
            .map(|cached| cached.token.clone())
    }

    #[instrument(skip(self), fields(app_id = %self.credential.app_id))]
    async fn fetch(&self) -> Result<CachedToken, LarkError> {
        let url = self.config.api_url(TOKEN_PATH);
        let request = TenantTokenRequest {
            app_id: &self.credential.app_id,
            app_secret: &self.credential.app_secret,
        };

        debug!("requesting tenant access token");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LarkError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LarkError::Auth(describe_http_failure(status, &body)));
        }

        let body: TenantTokenResponse = response
            .json()
            .await
            .map_err(|e| LarkError::Auth(format!("malformed token response: {e}")))?;

        if !body.is_ok() {
            let message = body.error_message();
            warn!(code = ?body.code, error = %message, "token request rejected");
            return Err(LarkError::Auth(message));
        }

        let token = body
            .tenant_access_token
            .ok_or_else(|| LarkError::Auth("response missing tenant_access_token".into()))?;
        let ttl = body.expire.map_or(DEFAULT_TOKEN_TTL, Duration::from_secs);

        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + DEFAULT_TOKEN_TTL);

        debug!(ttl_secs = ttl.as_secs(), "tenant access token refreshed");

        Ok(CachedToken { token, expires_at })
    }
}
