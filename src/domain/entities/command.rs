/// Commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// `CONSULTAR` - show the sender's customer profile
    Consultar,
    /// `DESCUENTO <value>` - update the sender's discount; `raw` is the unparsed value
    Descuento { raw: String },
    /// `AYUDA` or `HELP`
    Ayuda,
    /// Anything else
    Unknown,
}

impl BotCommand {
    pub fn as_str(&self) -> &str {
        match self {
            BotCommand::Consultar => "CONSULTAR",
            BotCommand::Descuento { .. } => "DESCUENTO",
            BotCommand::Ayuda => "AYUDA",
            BotCommand::Unknown => "unknown",
        }
    }
}

/// A parsed inbound command, never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Sender phone number
    pub sender: String,
    /// Trimmed, uppercased message body
    pub text: String,
    pub command: BotCommand,
}
