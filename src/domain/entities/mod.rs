//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod customer;
pub mod article;
pub mod event;
mod fields;

pub use user::UserProfile;
pub use message::{InboundMessage, chat_id_for_phone, phone_from_chat_id, CHAT_SUFFIX};
pub use command::{BotCommand, CommandRecord};
pub use customer::CustomerProfile;
pub use article::{Article, ArticleQuery, ArticleTotals};
pub use event::ProviderEvent;
