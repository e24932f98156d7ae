//! Control API - HTTP surface of the running bot

pub mod handlers;
pub mod server;

pub use server::{router, serve, start_server, ControlState};
