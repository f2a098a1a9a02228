//! Session store trait for per-session turn history.
//!
//! History is append-only from the server's point of view: turns are never
//! reordered, rewritten, or deduplicated. Implementations: in-memory
//! (process lifetime). A persistent backend can slot in behind the same
//! trait.

use crate::error::MemoryError;
use crate::message::{Message, SessionId};
use async_trait::async_trait;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Append one turn. No-op for an empty session id.
    async fn append(&self, session: &SessionId, turn: Message) -> Result<(), MemoryError>;

    /// Append several turns as one unit, so no other append lands between
    /// them. No-op for an empty session id.
    async fn append_all(&self, session: &SessionId, turns: Vec<Message>)
    -> Result<(), MemoryError>;

    /// The last `n` turns in original order (all of them if fewer exist).
    /// Unknown sessions yield an empty list.
    async fn recent(&self, session: &SessionId, n: usize) -> Result<Vec<Message>, MemoryError>;

    /// The full history, for display.
    async fn all(&self, session: &SessionId) -> Result<Vec<Message>, MemoryError>;

    /// Number of sessions currently held.
    async fn session_count(&self) -> Result<usize, MemoryError>;
}
