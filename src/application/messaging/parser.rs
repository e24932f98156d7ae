//! Message parser - Normalizes inbound text into commands

use crate::domain::entities::{BotCommand, CommandRecord, InboundMessage};

const DISCOUNT_PREFIX: &str = "DESCUENTO ";

/// Parses inbound messages into command records
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageParser;

impl MessageParser {
    pub fn new() -> Self {
        Self
    }

    /// Trim and uppercase a message body
    pub fn normalize(text: &str) -> String {
        text.trim().to_uppercase()
    }

    /// Parse an inbound message
    pub fn parse(&self, message: &InboundMessage) -> CommandRecord {
        let text = Self::normalize(&message.body);
        let command = Self::classify(&text);

        CommandRecord {
            sender: message.sender_phone().to_string(),
            text,
            command,
        }
    }

    /// Match normalized text against the command grammar, in priority order
    pub fn classify(text: &str) -> BotCommand {
        if text == "CONSULTAR" {
            return BotCommand::Consultar;
        }

        if let Some(rest) = text.strip_prefix(DISCOUNT_PREFIX) {
            return BotCommand::Descuento {
                raw: rest.trim().to_string(),
            };
        }

        if text == "AYUDA" || text == "HELP" {
            return BotCommand::Ayuda;
        }

        BotCommand::Unknown
    }
}
