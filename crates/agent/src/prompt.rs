//! Prompt assembly.
//!
//! The message list sent upstream is always, in this order:
//!
//! 1. one system message (preamble, notes, catalog brief)
//! 2. at most `history_window` past turns of the session, oldest first
//! 3. the new user turn
//!
//! History is never reordered, deduplicated, or summarized.

use campusbot_config::ChatConfig;
use campusbot_core::error::MemoryError;
use campusbot_core::message::{Message, SessionId};
use campusbot_core::session::SessionStore;
use campusbot_knowledge::KnowledgeStore;
use std::sync::Arc;
use tracing::debug;

/// Past turns sent with each message.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;
/// Programs listed in the catalog brief.
pub const DEFAULT_BRIEF_LIMIT: usize = 20;

pub const DEFAULT_PREAMBLE: &str = "You are the admissions advisor assistant for the college.\n\
Always answer from the institution's own data first (programs, tuition, dormitories, careers).\n\
If you are not sure, say you will check and get back to the student instead of guessing.";

pub const NO_NOTES_PLACEHOLDER: &str = "(no institutional information available yet)";
pub const NO_CATALOG_PLACEHOLDER: &str = "(no program data available yet)";
pub const CATALOG_HEADER: &str = "Program catalog (abridged):";

/// Builds the upstream message list from the knowledge and session stores.
pub struct PromptAssembler {
    knowledge: Arc<KnowledgeStore>,
    sessions: Arc<dyn SessionStore>,
    preamble: String,
    history_window: usize,
    brief_limit: usize,
}

impl PromptAssembler {
    pub fn new(knowledge: Arc<KnowledgeStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            knowledge,
            sessions,
            preamble: DEFAULT_PREAMBLE.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            brief_limit: DEFAULT_BRIEF_LIMIT,
        }
    }

    pub fn from_config(
        knowledge: Arc<KnowledgeStore>,
        sessions: Arc<dyn SessionStore>,
        config: &ChatConfig,
    ) -> Self {
        let mut assembler = Self::new(knowledge, sessions)
            .with_history_window(config.history_window)
            .with_brief_limit(config.brief_limit);
        if let Some(preamble) = &config.system_preamble {
            assembler = assembler.with_preamble(preamble.clone());
        }
        assembler
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_brief_limit(mut self, limit: usize) -> Self {
        self.brief_limit = limit;
        self
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// The system block built from the current knowledge snapshot.
    pub fn system_prompt(&self) -> String {
        let notes = self.knowledge.notes();
        let brief = self.knowledge.brief_summary(self.brief_limit);
        build_system_prompt(&self.preamble, &notes, &brief)
    }

    /// Assemble the full message list for one user message.
    pub async fn assemble(
        &self,
        session: &SessionId,
        user_message: &str,
    ) -> Result<Vec<Message>, MemoryError> {
        let history = self.sessions.recent(session, self.history_window).await?;
        debug!(session = %session, history = history.len(), "Assembling prompt");
        Ok(compose(
            self.system_prompt(),
            history,
            user_message,
            self.history_window,
        ))
    }
}

/// Join the preamble, notes and catalog brief into the system text,
/// substituting placeholders for empty sections.
pub fn build_system_prompt(preamble: &str, notes: &str, brief: &str) -> String {
    let notes = if notes.is_empty() {
        NO_NOTES_PLACEHOLDER
    } else {
        notes
    };
    let brief = if brief.is_empty() {
        NO_CATALOG_PLACEHOLDER
    } else {
        brief
    };
    [preamble, "", notes, CATALOG_HEADER, brief].join("\n")
}

/// System message, then the last `window` history turns, then the user turn.
pub fn compose(
    system: String,
    mut history: Vec<Message>,
    user_message: &str,
    window: usize,
) -> Vec<Message> {
    if history.len() > window {
        history.drain(..history.len() - window);
    }
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend(history);
    messages.push(Message::user(user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusbot_core::message::Role;
    use campusbot_memory::InMemorySessionStore;
    use std::fs;

    fn empty_knowledge() -> Arc<KnowledgeStore> {
        Arc::new(KnowledgeStore::new("/nonexistent", "/nonexistent/majors.json"))
    }

    async fn sessions_with(id: &SessionId, turns: usize) -> Arc<InMemorySessionStore> {
        let store = Arc::new(InMemorySessionStore::new());
        for i in 0..turns {
            let msg = if i % 2 == 0 {
                Message::user(format!("turn {i}"))
            } else {
                Message::assistant(format!("turn {i}"))
            };
            store.append(id, msg).await.unwrap();
        }
        store
    }

    #[test]
    fn placeholders_fill_empty_sections() {
        let prompt = build_system_prompt("PRE", "", "");
        assert_eq!(
            prompt,
            format!("PRE\n\n{NO_NOTES_PLACEHOLDER}\n{CATALOG_HEADER}\n{NO_CATALOG_PLACEHOLDER}")
        );
    }

    #[test]
    fn sections_appear_in_order() {
        let prompt = build_system_prompt("PRE", "fees.txt:\nfee info", "- IT (Bachelor) | group: Tech");
        let pre = prompt.find("PRE").unwrap();
        let notes = prompt.find("fee info").unwrap();
        let header = prompt.find(CATALOG_HEADER).unwrap();
        let brief = prompt.find("- IT (Bachelor)").unwrap();
        assert!(pre < notes && notes < header && header < brief);
        assert!(!prompt.contains(NO_NOTES_PLACEHOLDER));
    }

    #[tokio::test]
    async fn shape_holds_for_any_history_length() {
        for turns in [0usize, 3, 50] {
            let id = SessionId::from("s");
            let sessions = sessions_with(&id, turns).await;
            let assembler = PromptAssembler::new(empty_knowledge(), sessions);

            let messages = assembler.assemble(&id, "new question").await.unwrap();
            let expected_history = turns.min(DEFAULT_HISTORY_WINDOW);

            assert_eq!(messages.len(), expected_history + 2, "history of {turns}");
            assert_eq!(messages[0].role, Role::System);
            assert_eq!(messages.iter().filter(|m| m.role == Role::System).count(), 1);
            let last = messages.last().unwrap();
            assert_eq!(last.role, Role::User);
            assert_eq!(last.content, "new question");

            if turns > 0 {
                // The newest stored turn sits right before the new user turn
                assert_eq!(messages[messages.len() - 2].content, format!("turn {}", turns - 1));
            }
        }
    }

    #[tokio::test]
    async fn history_window_keeps_most_recent_in_order() {
        let id = SessionId::from("s");
        let sessions = sessions_with(&id, 50).await;
        let assembler = PromptAssembler::new(empty_knowledge(), sessions);

        let messages = assembler.assemble(&id, "q").await.unwrap();
        let history: Vec<_> = messages[1..messages.len() - 1]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        let expected: Vec<String> = (40..50).map(|i| format!("turn {i}")).collect();
        assert_eq!(history, expected);
    }

    #[tokio::test]
    async fn first_message_has_no_history() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let assembler = PromptAssembler::new(empty_knowledge(), sessions);

        let messages = assembler.assemble(&SessionId::from("fresh"), "hello").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::user("hello"));
    }

    #[tokio::test]
    async fn system_block_reflects_current_knowledge() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("majors.json"),
            r#"[{"slug":"it","name":"Information Technology","level":"Bachelor","career_group":"Technology"}]"#,
        )
        .unwrap();
        fs::write(tmp.path().join("dorm.md"), "Dormitory open all year").unwrap();
        let knowledge = Arc::new(KnowledgeStore::new(tmp.path(), tmp.path().join("majors.json")));
        knowledge.reload();

        let assembler = PromptAssembler::new(knowledge, Arc::new(InMemorySessionStore::new()))
            .with_preamble("Be helpful.");
        let system = assembler.system_prompt();

        assert!(system.starts_with("Be helpful.\n\n"));
        assert!(system.contains("dorm.md:\nDormitory open all year"));
        assert!(system.contains("- Information Technology (Bachelor) | group: Technology"));
        assert!(!system.contains(NO_CATALOG_PLACEHOLDER));
    }

    #[test]
    fn config_overrides_defaults() {
        let config = ChatConfig {
            history_window: 4,
            brief_limit: 2,
            system_preamble: Some("Custom".into()),
        };
        let assembler = PromptAssembler::from_config(
            empty_knowledge(),
            Arc::new(InMemorySessionStore::new()),
            &config,
        );
        assert_eq!(assembler.history_window(), 4);
        assert!(assembler.system_prompt().starts_with("Custom\n"));
    }
}
