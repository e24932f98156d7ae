//! Messaging provider adapters

pub mod console;
