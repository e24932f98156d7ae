use async_trait::async_trait;

use crate::application::errors::BotError;

/// Credentials accepted by the remote login endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    /// Token lifetime in seconds, as declared by the server
    pub expires_in: i64,
}

/// Remote authentication for the operator panel
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a token. A rejected login is `BotError::Auth`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthGrant, BotError>;
}
