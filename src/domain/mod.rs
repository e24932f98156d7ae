//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (messages, commands, customers, articles)
//! - Traits: Abstractions for infrastructure (provider, directory, store, clock)

pub mod entities;
pub mod traits;
