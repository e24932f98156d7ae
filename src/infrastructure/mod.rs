//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Session persistence
//! - Adapters: Messaging provider integrations
//! - Apex: Remote customer directory, login and article report
//! - Control: HTTP API of the running bot
//! - Panel: Client for the control API

pub mod config;
pub mod storage;
pub mod adapters;
pub mod apex;
pub mod control;
pub mod panel;
