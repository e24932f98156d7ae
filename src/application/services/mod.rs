//! Application services - Business logic orchestration

pub mod session_service;
pub mod connection_service;
pub mod bot_runtime;
pub mod panel_service;
pub mod report_service;

pub use session_service::{ExpiryWatcher, SessionService};
pub use connection_service::{ConnectionMachine, ConnectionSnapshot, ConnectionState, RetryPolicy};
pub use bot_runtime::BotRuntime;
pub use panel_service::{PanelService, SessionInfo, WatchOutcome};
pub use report_service::{render_table, ArticleReport, ReportService};
