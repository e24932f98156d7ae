//! Domain traits - Abstractions for infrastructure implementations

pub mod provider;
pub mod directory;
pub mod store;
pub mod clock;
pub mod auth;
pub mod report;
pub mod control;

pub use provider::{MessagingProvider, ProviderInfo};
pub use directory::CustomerDirectory;
pub use store::Store;
pub use clock::{Clock, SystemClock};
pub use auth::{AuthGrant, Authenticator};
pub use report::ArticleSource;
pub use control::{BotControl, BotStatus};
