//! Bot runtime - drives the messaging session
//!
//! The runtime owns the `ConnectionMachine`, feeds it provider events, runs
//! retries on a timer, and hands inbound messages to the dispatcher. Each
//! message is handled in its own task so a slow directory call only delays
//! that sender's reply.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::Sleep;

use crate::application::messaging::CommandDispatcher;
use crate::domain::entities::{InboundMessage, ProviderEvent};
use crate::domain::traits::MessagingProvider;
use super::connection_service::{ConnectionMachine, ConnectionSnapshot, Directive, RetryPolicy};

const EVENT_BUFFER: usize = 64;

type PendingRetry = Option<Pin<Box<Sleep>>>;

/// Messaging session runtime
pub struct BotRuntime {
    provider: Arc<dyn MessagingProvider>,
    dispatcher: Arc<CommandDispatcher>,
    machine: ConnectionMachine,
    status: watch::Sender<ConnectionSnapshot>,
}

impl BotRuntime {
    /// Create a runtime and the receiver the control API reads status from
    pub fn new(
        provider: Arc<dyn MessagingProvider>,
        dispatcher: Arc<CommandDispatcher>,
        policy: RetryPolicy,
    ) -> (Self, watch::Receiver<ConnectionSnapshot>) {
        let machine = ConnectionMachine::new(policy);
        let (status, status_rx) = watch::channel(machine.snapshot());
        (
            Self {
                provider,
                dispatcher,
                machine,
                status,
            },
            status_rx,
        )
    }

    /// Run until `shutdown` flips to true
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
        let info = self.provider.provider_info();
        tracing::info!("Starting messaging runtime with provider {}", info.name);

        let mut retry: PendingRetry = None;
        self.establish(&events_tx, &mut retry).await;

        loop {
            tokio::select! {
                Some(event) = events_rx.recv() => {
                    self.handle_event(event, &mut retry);
                }
                _ = retry_elapsed(&mut retry) => {
                    retry = None;
                    tracing::info!("Retrying messaging initialization...");
                    self.establish(&events_tx, &mut retry).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Messaging runtime stopped");
                        return;
                    }
                }
            }
        }
    }

    async fn establish(&mut self, events: &mpsc::Sender<ProviderEvent>, retry: &mut PendingRetry) {
        if !self.machine.begin_attempt() {
            tracing::warn!("Maximum init attempts reached, messaging disabled");
            self.publish();
            return;
        }

        tracing::info!(
            "Initializing messaging session (failed attempts so far: {})",
            self.machine.attempts()
        );
        self.publish();

        if let Err(e) = self.provider.initialize(events.clone()).await {
            tracing::error!("Error initializing messaging session: {}", e);
            let directive = self.machine.fail();
            self.publish();
            self.follow(directive, retry);
        }
    }

    fn handle_event(&mut self, event: ProviderEvent, retry: &mut PendingRetry) {
        match &event {
            ProviderEvent::Qr(_) => tracing::info!("Pairing code generated"),
            ProviderEvent::Ready => tracing::info!("Messaging session ready"),
            ProviderEvent::Error(e) => tracing::error!("Messaging session error: {}", e),
            ProviderEvent::Disconnected => tracing::warn!("Messaging session disconnected"),
            ProviderEvent::Message(message) => {
                self.spawn_dispatch(message.clone());
                return;
            }
        }

        let directive = self.machine.apply(&event);
        self.publish();
        self.follow(directive, retry);
    }

    fn follow(&self, directive: Option<Directive>, retry: &mut PendingRetry) {
        match directive {
            Some(Directive::ScheduleRetry(delay)) => {
                tracing::info!("Retrying initialization in {:?}", delay);
                *retry = Some(Box::pin(tokio::time::sleep(delay)));
            }
            Some(Directive::Disable) => {
                tracing::warn!("Maximum init attempts reached, messaging disabled");
                *retry = None;
            }
            None => {}
        }
    }

    fn spawn_dispatch(&self, message: InboundMessage) {
        let dispatcher = self.dispatcher.clone();
        let provider = self.provider.clone();

        tokio::spawn(async move {
            tracing::info!("Message received from {}", message.sender_phone());
            let reply = dispatcher.dispatch(&message).await;
            if let Err(e) = provider.send_message(&message.chat_id, &reply).await {
                tracing::error!("Error replying to {}: {}", message.chat_id, e);
            }
        });
    }

    fn publish(&self) {
        self.status.send_replace(self.machine.snapshot());
    }
}

async fn retry_elapsed(retry: &mut PendingRetry) {
    match retry {
        Some(sleep) => sleep.as_mut().await,
        None => pending::<()>().await,
    }
}
