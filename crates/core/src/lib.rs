//! # DigiBuddy Core
//!
//! Domain types, traits, and error definitions for the DigiBuddy response
//! router. This crate has **no framework dependencies**: it defines the
//! domain model that the provider, resolver and gateway crates build on.
//!
//! - [`KnowledgeBase`]: the immutable, ordered table of curated answers
//! - [`Provider`]: the seam to the external language model
//! - [`Message`] / [`Turn`]: what flows between caller, resolver and model

pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{KnowledgeError, ProviderError};
pub use knowledge::{KnowledgeBase, KnowledgeEntry};
pub use message::{Message, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
