use thiserror::Error;

/// Errors surfaced by the messaging client.
///
/// Each network stage of a send has its own variant so callers can tell
/// which step failed. Transport failures are folded into the variant of the
/// stage they happened in. Nothing here is retried.
#[derive(Debug, Error)]
pub enum LarkError {
    /// Required inputs are missing or malformed. Raised before any network
    /// call is made.
    #[error("{0}")]
    Validation(String),

    /// The tenant access token could not be obtained.
    #[error("failed to get tenant access token: {0}")]
    Auth(String),

    /// An image upload failed. The whole send is aborted.
    #[error("failed to upload image: {0}")]
    Upload(String),

    /// The final message delivery call failed.
    #[error("failed to send message: {0}")]
    Delivery(String),

    /// The HTTP client could not be constructed.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl LarkError {
    /// Returns `true` when the error was raised locally for bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
