//! Console provider for development/testing
//!
//! Simulates a messaging session on stdin/stdout. Lines typed as
//! `<phone>: <text>` arrive as inbound messages; `/pair`, `/drop` and
//! `/fail [reason]` drive the session lifecycle.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{InboundMessage, ProviderEvent};
use crate::domain::traits::{MessagingProvider, ProviderInfo};

/// Console messaging provider for local development
pub struct ConsoleProvider {
    info: ProviderInfo,
    auto_pair: bool,
    read_stdin: bool,
    reader_started: AtomicBool,
}

impl ConsoleProvider {
    pub fn new() -> Self {
        Self {
            info: ProviderInfo {
                id: "console".to_string(),
                name: "console".to_string(),
            },
            auto_pair: false,
            read_stdin: true,
            reader_started: AtomicBool::new(false),
        }
    }

    /// Report the session ready right after the pairing code
    pub fn with_auto_pair(mut self, auto_pair: bool) -> Self {
        self.auto_pair = auto_pair;
        self
    }

    /// Skip the stdin reader; events then only come from `initialize`
    pub fn without_stdin(mut self) -> Self {
        self.read_stdin = false;
        self
    }

    fn spawn_reader(&self, events: mpsc::Sender<ProviderEvent>) {
        if !self.read_stdin || self.reader_started.swap(true, Ordering::SeqCst) {
            return;
        }

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(event) = parse_console_line(&line) else {
                            if !line.trim().is_empty() {
                                println!("Usage: <phone>: <text> | /pair | /drop | /fail [reason]");
                            }
                            continue;
                        };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Console read error: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Console reader stopped");
        });
    }
}

impl Default for ConsoleProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate one console line into a provider event
pub fn parse_console_line(line: &str) -> Option<ProviderEvent> {
    let line = line.trim();
    match line {
        "" => None,
        "/pair" => Some(ProviderEvent::Ready),
        "/drop" => Some(ProviderEvent::Disconnected),
        _ if line.starts_with("/fail") => {
            let reason = line.trim_start_matches("/fail").trim();
            let reason = if reason.is_empty() { "simulated failure" } else { reason };
            Some(ProviderEvent::Error(reason.to_string()))
        }
        _ => {
            let (phone, text) = line.split_once(':')?;
            let (phone, text) = (phone.trim(), text.trim());
            if phone.is_empty() || text.is_empty() || phone.starts_with('/') {
                return None;
            }
            Some(ProviderEvent::Message(InboundMessage::from_phone(phone, text)))
        }
    }
}

#[async_trait]
impl MessagingProvider for ConsoleProvider {
    async fn initialize(&self, events: mpsc::Sender<ProviderEvent>) -> Result<(), BotError> {
        tracing::info!("Starting console session (dev mode)");

        let code = format!("console-{}", uuid::Uuid::new_v4());
        println!("[PAIRING] {}  (type /pair to link)", code);
        events
            .send(ProviderEvent::Qr(code))
            .await
            .map_err(|e| BotError::Provider(e.to_string()))?;

        if self.auto_pair {
            events
                .send(ProviderEvent::Ready)
                .await
                .map_err(|e| BotError::Provider(e.to_string()))?;
        }

        self.spawn_reader(events);
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT -> {}] {}", chat_id, text);
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
