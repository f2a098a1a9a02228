//! The end-to-end message pipeline: assemble, complete, record.

use campusbot_core::error::{MemoryError, ProviderError};
use campusbot_core::message::{Message, SessionId};
use campusbot_core::session::SessionStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::completion::CompletionGateway;
use crate::prompt::PromptAssembler;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("userMessage required")]
    EmptyMessage,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Handles one chat message from start to finish.
pub struct ChatRelay {
    assembler: PromptAssembler,
    completion: CompletionGateway,
    sessions: Arc<dyn SessionStore>,
}

impl ChatRelay {
    /// `sessions` must be the same store the assembler reads history from.
    pub fn new(
        assembler: PromptAssembler,
        completion: CompletionGateway,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            assembler,
            completion,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn completion(&self) -> &CompletionGateway {
        &self.completion
    }

    /// Answer `user_message` in the context of `session`.
    ///
    /// On success the user turn and the reply are appended to the session
    /// as one pair. On failure the session is left untouched.
    pub async fn handle(&self, session: &SessionId, user_message: &str) -> Result<String, RelayError> {
        if user_message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let messages = self.assembler.assemble(session, user_message).await?;
        let reply = match self.completion.complete(messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %session, error = %e, "Completion failed");
                return Err(e.into());
            }
        };

        if !session.is_empty() {
            self.sessions
                .append_all(
                    session,
                    vec![Message::user(user_message), Message::assistant(reply.as_str())],
                )
                .await?;
        }

        info!(session = %session, reply_len = reply.len(), "Message answered");
        Ok(reply)
    }
}
