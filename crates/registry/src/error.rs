use thiserror::Error;

/// Errors from bot registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("bot already exists: {0}")]
    Duplicate(String),

    #[error("bot not found: {0}")]
    NotFound(String),

    #[error("bot is disabled: {0}")]
    Disabled(String),

    #[error("invalid bot: {0}")]
    InvalidInput(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl RegistryError {
    /// Returns `true` when the named bot cannot be used for sending, either
    /// because it does not exist or because it is disabled.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Disabled(_))
    }
}
