//! # campusbot core
//!
//! Domain types, traits, and error definitions for the campusbot relay.
//! This crate has **no framework dependencies**: it defines the model that
//! the knowledge store, session store, upstream client, and HTTP gateway
//! all implement against.
//!
//! The two seams that matter most are traits:
//! - [`Provider`] abstracts the upstream chat-completion API
//! - [`SessionStore`] abstracts where per-session turn history lives
//!
//! Both are injected as `Arc<dyn ...>` so tests and future backends can
//! swap them without touching call sites.

pub mod catalog;
pub mod error;
pub mod message;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use catalog::{Contact, ProgramRecord, TuitionRange};
pub use error::{Error, KnowledgeError, MemoryError, ProviderError, Result};
pub use message::{Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::SessionStore;
