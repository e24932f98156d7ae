//! Message handling - Command parsing and dispatch

pub mod dispatcher;
pub mod parser;
pub mod replies;

pub use dispatcher::{CommandDispatcher, parse_discount};
pub use parser::MessageParser;
