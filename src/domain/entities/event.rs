use super::InboundMessage;

/// Events emitted by the messaging provider.
///
/// This is the closed set the connection state machine and the runtime
/// consume; providers translate their own callbacks into these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// A pairing payload was generated and must be shown to the operator
    Qr(String),
    /// The session is authenticated and can send and receive
    Ready,
    /// Establishment or runtime failure
    Error(String),
    /// The session was closed by the provider
    Disconnected,
    /// An inbound chat message
    Message(InboundMessage),
}

impl ProviderEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderEvent::Qr(_) => "qr",
            ProviderEvent::Ready => "ready",
            ProviderEvent::Error(_) => "error",
            ProviderEvent::Disconnected => "disconnected",
            ProviderEvent::Message(_) => "message",
        }
    }
}
