//! In-memory session store. History lives for the life of the process.

use async_trait::async_trait;
use campusbot_core::error::MemoryError;
use campusbot_core::message::{Message, SessionId};
use campusbot_core::session::SessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Keeps every session's turns in a map keyed by session id.
///
/// Sessions are never evicted, so memory grows with the number of
/// distinct ids seen.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, session: &SessionId, turn: Message) -> Result<(), MemoryError> {
        self.append_all(session, vec![turn]).await
    }

    async fn append_all(
        &self,
        session: &SessionId,
        turns: Vec<Message>,
    ) -> Result<(), MemoryError> {
        if session.is_empty() || turns.is_empty() {
            return Ok(());
        }
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session.as_str().to_string()).or_default();
        history.extend(turns);
        debug!(session = %session, turns = history.len(), "Session history updated");
        Ok(())
    }

    async fn recent(&self, session: &SessionId, n: usize) -> Result<Vec<Message>, MemoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session.as_str())
            .map(|history| history[history.len().saturating_sub(n)..].to_vec())
            .unwrap_or_default())
    }

    async fn all(&self, session: &SessionId) -> Result<Vec<Message>, MemoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session.as_str()).cloned().unwrap_or_default())
    }

    async fn session_count(&self) -> Result<usize, MemoryError> {
        Ok(self.sessions.read().await.len())
    }
}
