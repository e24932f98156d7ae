//! Command dispatcher - Routes inbound messages to command handlers

use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::{BotCommand, InboundMessage};
use crate::domain::traits::CustomerDirectory;
use super::parser::MessageParser;
use super::replies;

/// Parse a discount argument; rejects anything that is not a finite number
pub fn parse_discount(raw: &str) -> Result<f64, CommandError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidArgs(format!("not a number: {}", raw)))
}

/// Dispatches inbound messages and produces the reply text.
///
/// Remote failures are turned into replies here and never returned, so one
/// bad request cannot stop later messages from being handled.
pub struct CommandDispatcher {
    parser: MessageParser,
    directory: Arc<dyn CustomerDirectory>,
}

impl CommandDispatcher {
    pub fn new(directory: Arc<dyn CustomerDirectory>) -> Self {
        Self {
            parser: MessageParser::new(),
            directory,
        }
    }

    /// Handle one inbound message and return the reply to send back
    pub async fn dispatch(&self, message: &InboundMessage) -> String {
        let record = self.parser.parse(message);
        tracing::debug!(
            "[{}] {} -> {}",
            record.sender,
            record.text.chars().take(50).collect::<String>(),
            record.command.as_str()
        );

        match &record.command {
            BotCommand::Consultar => self.consultar(&record.sender).await,
            BotCommand::Descuento { raw } => self.descuento(&record.sender, raw).await,
            BotCommand::Ayuda => replies::HELP.to_string(),
            BotCommand::Unknown => replies::GREETING.to_string(),
        }
    }

    async fn consultar(&self, phone: &str) -> String {
        match self.directory.lookup(phone).await {
            Ok(Some(profile)) => replies::customer_summary(&profile),
            Ok(None) => {
                tracing::info!("[{}] Customer not found", phone);
                replies::CUSTOMER_NOT_FOUND.to_string()
            }
            Err(e) => {
                tracing::warn!("[{}] Customer lookup failed: {}", phone, e);
                replies::LOOKUP_FAILED.to_string()
            }
        }
    }

    async fn descuento(&self, phone: &str, raw: &str) -> String {
        let value = match parse_discount(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("[{}] Rejected discount: {}", phone, e);
                return replies::DISCOUNT_FORMAT_ERROR.to_string();
            }
        };

        match self.directory.update_discount(phone, value).await {
            Ok(true) => {
                tracing::info!("[{}] Discount updated to {}", phone, value);
                replies::discount_updated(raw, phone)
            }
            Ok(false) => {
                tracing::info!("[{}] Discount update rejected", phone);
                replies::DISCOUNT_REJECTED.to_string()
            }
            Err(e) => {
                tracing::warn!("[{}] Discount update failed: {}", phone, e);
                replies::DISCOUNT_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::application::errors::DirectoryError;
    use crate::domain::entities::CustomerProfile;

    /// Directory double that records calls and answers from a fixed script
    #[derive(Default)]
    struct RecordingDirectory {
        profile: Option<CustomerProfile>,
        accept_updates: bool,
        unreachable: bool,
        lookups: Mutex<Vec<String>>,
        updates: Mutex<Vec<(String, f64)>>,
    }

    #[async_trait]
    impl CustomerDirectory for RecordingDirectory {
        async fn lookup(&self, phone: &str) -> Result<Option<CustomerProfile>, DirectoryError> {
            self.lookups.lock().unwrap().push(phone.to_string());
            if self.unreachable {
                return Err(DirectoryError::Transport("connection refused".to_string()));
            }
            Ok(self.profile.clone())
        }

        async fn update_discount(&self, phone: &str, discount: f64) -> Result<bool, DirectoryError> {
            self.updates.lock().unwrap().push((phone.to_string(), discount));
            if self.unreachable {
                return Err(DirectoryError::Transport("connection refused".to_string()));
            }
            Ok(self.accept_updates)
        }
    }

    fn ana() -> CustomerProfile {
        CustomerProfile {
            nombre: "Ana".to_string(),
            telefono: "595981234567".to_string(),
            descuento: 5.0,
            estado: "ACTIVO".to_string(),
        }
    }

    fn setup(directory: RecordingDirectory) -> (Arc<RecordingDirectory>, CommandDispatcher) {
        let directory = Arc::new(directory);
        let dispatcher = CommandDispatcher::new(directory.clone());
        (directory, dispatcher)
    }

    fn msg(body: &str) -> InboundMessage {
        InboundMessage::new("595981234567@c.us", body)
    }

    #[test]
    fn parse_discount_accepts_numbers_only() {
        assert_eq!(parse_discount("15"), Ok(15.0));
        assert_eq!(parse_discount(" 12.5 "), Ok(12.5));
        assert!(parse_discount("ABC").is_err());
        assert!(parse_discount("NAN").is_err());
        assert!(parse_discount("INF").is_err());
        assert!(parse_discount("").is_err());
    }

    #[tokio::test]
    async fn consultar_replies_with_profile() {
        let (directory, dispatcher) = setup(RecordingDirectory {
            profile: Some(ana()),
            ..Default::default()
        });

        for body in ["consultar", "CONSULTAR", " Consultar "] {
            let reply = dispatcher.dispatch(&msg(body)).await;
            assert!(reply.contains("Nombre: Ana"), "reply: {}", reply);
        }
        assert_eq!(*directory.lookups.lock().unwrap(), vec!["595981234567"; 3]);
    }

    #[tokio::test]
    async fn consultar_not_found() {
        let (_, dispatcher) = setup(RecordingDirectory::default());
        let reply = dispatcher.dispatch(&msg("CONSULTAR")).await;
        assert_eq!(reply, replies::CUSTOMER_NOT_FOUND);
    }

    #[tokio::test]
    async fn consultar_transport_failure_becomes_reply() {
        let (_, dispatcher) = setup(RecordingDirectory {
            unreachable: true,
            ..Default::default()
        });
        let reply = dispatcher.dispatch(&msg("CONSULTAR")).await;
        assert_eq!(reply, replies::LOOKUP_FAILED);
    }

    #[tokio::test]
    async fn descuento_non_numeric_makes_no_remote_call() {
        let (directory, dispatcher) = setup(RecordingDirectory::default());
        let reply = dispatcher.dispatch(&msg("DESCUENTO abc")).await;

        assert_eq!(reply, replies::DISCOUNT_FORMAT_ERROR);
        assert!(directory.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn descuento_issues_exactly_one_update() {
        let (directory, dispatcher) = setup(RecordingDirectory {
            accept_updates: true,
            ..Default::default()
        });
        let reply = dispatcher.dispatch(&msg("DESCUENTO 15")).await;

        assert_eq!(
            *directory.updates.lock().unwrap(),
            vec![("595981234567".to_string(), 15.0)]
        );
        assert!(reply.contains("Nuevo descuento: 15%"));
        assert!(reply.contains("Teléfono: 595981234567"));
    }

    #[tokio::test]
    async fn descuento_rejected_and_failed() {
        let (_, dispatcher) = setup(RecordingDirectory::default());
        assert_eq!(dispatcher.dispatch(&msg("DESCUENTO 10")).await, replies::DISCOUNT_REJECTED);

        let (_, dispatcher) = setup(RecordingDirectory {
            unreachable: true,
            ..Default::default()
        });
        assert_eq!(dispatcher.dispatch(&msg("DESCUENTO 10")).await, replies::DISCOUNT_FAILED);
    }

    #[tokio::test]
    async fn help_and_fallback() {
        let (directory, dispatcher) = setup(RecordingDirectory::default());

        assert_eq!(dispatcher.dispatch(&msg("ayuda")).await, replies::HELP);
        assert_eq!(dispatcher.dispatch(&msg("HELP")).await, replies::HELP);
        assert_eq!(dispatcher.dispatch(&msg("buenas tardes")).await, replies::GREETING);
        assert!(directory.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_block_next_message() {
        let (_, dispatcher) = setup(RecordingDirectory {
            unreachable: true,
            ..Default::default()
        });
        let _ = dispatcher.dispatch(&msg("CONSULTAR")).await;
        assert_eq!(dispatcher.dispatch(&msg("AYUDA")).await, replies::HELP);
    }
}
