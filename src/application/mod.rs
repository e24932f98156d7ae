//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing, replies, dispatching
//! - Services: Session, connection, runtime, panel and report orchestration

pub mod errors;
pub mod services;
pub mod messaging;
