//! apex-bot - WhatsApp command bot and operator panel for an Oracle APEX backend
//!
//! Layers:
//! - domain: entities and traits with no I/O
//! - application: errors, message dispatch, session and connection services
//! - infrastructure: config, storage, adapters, HTTP clients and servers

pub mod domain;
pub mod application;
pub mod infrastructure;
