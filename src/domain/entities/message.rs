use chrono::{DateTime, Utc};

/// Suffix the messaging provider appends to phone numbers to form chat ids
pub const CHAT_SUFFIX: &str = "@c.us";

/// An inbound chat message as delivered by the messaging provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub chat_id: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(chat_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    /// Build a message from a bare phone number
    pub fn from_phone(phone: &str, body: impl Into<String>) -> Self {
        Self::new(chat_id_for_phone(phone), body)
    }

    /// Phone number of the sender, without the provider suffix
    pub fn sender_phone(&self) -> &str {
        phone_from_chat_id(&self.chat_id)
    }
}

/// Strip the provider suffix from a chat id
pub fn phone_from_chat_id(chat_id: &str) -> &str {
    chat_id.strip_suffix(CHAT_SUFFIX).unwrap_or(chat_id)
}

/// Chat id for a phone number; ids that already carry the suffix pass through
pub fn chat_id_for_phone(phone: &str) -> String {
    if phone.contains(CHAT_SUFFIX) {
        phone.to_string()
    } else {
        format!("{}{}", phone, CHAT_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_phone_strips_suffix() {
        let msg = InboundMessage::new("595981234567@c.us", "hola");
        assert_eq!(msg.sender_phone(), "595981234567");

        let bare = InboundMessage::new("595981234567", "hola");
        assert_eq!(bare.sender_phone(), "595981234567");
    }

    #[test]
    fn chat_id_appends_suffix_once() {
        assert_eq!(chat_id_for_phone("595981234567"), "595981234567@c.us");
        assert_eq!(chat_id_for_phone("595981234567@c.us"), "595981234567@c.us");
    }
}
