use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;

/// Session status as reported by the control API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    pub connected: bool,
    pub qr_code: Option<String>,
}

/// Operator access to a running bot
#[async_trait]
pub trait BotControl: Send + Sync {
    async fn status(&self) -> Result<BotStatus, BotError>;

    /// Send a text to a phone number through the bot's session
    async fn send_message(&self, phone: &str, message: &str) -> Result<(), BotError>;
}
