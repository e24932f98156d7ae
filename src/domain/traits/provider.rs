use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::entities::ProviderEvent;
use crate::application::errors::BotError;

/// Messaging provider trait - abstraction over the chat platform session
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Start establishing a session.
    ///
    /// Lifecycle progress (pairing code, ready, errors, inbound messages) is
    /// reported through `events`. An `Err` return counts as a failed
    /// establishment attempt.
    async fn initialize(&self, events: mpsc::Sender<ProviderEvent>) -> Result<(), BotError>;

    /// Send a text message to a chat id (`<phone>@c.us`)
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Get provider info
    fn provider_info(&self) -> ProviderInfo;
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}
