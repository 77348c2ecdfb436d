//! Optional shared API key protecting the `/api/*` routes.
//!
//! Callers present the key either as `X-API-Key: <key>` or as
//! `Authorization: Bearer <key>`. Keys are compared as SHA-256 digests in
//! constant time.

use std::fmt;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::AppState;
use crate::error::ServerError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Hash a raw API key to its 32-byte SHA-256 digest.
pub fn hash_api_key(raw_key: &str) -> [u8; 32] {
    Sha256::digest(raw_key.as_bytes()).into()
}

/// The configured key, held only as its digest.
#[derive(Clone)]
pub struct ApiKey {
    digest: [u8; 32],
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl ApiKey {
    pub fn new(raw_key: &str) -> Self {
        Self {
            digest: hash_api_key(raw_key),
        }
    }

    pub fn verify(&self, presented: &str) -> bool {
        hash_api_key(presented)[..].ct_eq(&self.digest[..]).into()
    }
}

/// Pull the presented key out of the request headers.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware rejecting requests without a valid key. A no-op when no key
/// is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(expected) = state.api_key.as_ref() else {
        return Ok(next.run(request).await);
    };

    let verified = presented_key(request.headers()).map(|key| expected.verify(key));
    match verified {
        Some(true) => Ok(next.run(request).await),
        Some(false) => Err(ServerError::Unauthorized("invalid API key".into())),
        None => Err(ServerError::Unauthorized("missing API key".into())),
    }
}
