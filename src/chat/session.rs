use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use super::messages::{
    COMMAND_REMINDER, CONSOLIDATING_BANNER, CRITERIA_PROMPT, NO_MORE_AFTER_CONTINUE, SCHEMA_INTRO,
};
use super::state_machine::{transition, Action, ConversationStep, Transition};
use crate::core::types::Record;
use crate::tools::consolidate::consolidate;
use crate::tools::extract::{
    extract_batch, log_failure, BatchContext, BatchOutcome, ExtractionError, NO_MORE_RESORTS,
};
use crate::tools::extraction_client::Conversation;
use crate::tools::prompt::BATCH_SIZE;
use crate::AppState;

/// Reply to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub html: String,
    /// The conversation ended (FINISH) and the session was reset.
    pub finished: bool,
}

impl ChatReply {
    fn text(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            finished: false,
        }
    }
}

/// One caller's conversation: the current step, every record collected so
/// far, the pagination offset and the extraction-service history.
#[derive(Debug)]
pub struct ChatSession {
    step: ConversationStep,
    records: Vec<Record>,
    page_offset: usize,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(max_history_turns: usize) -> Self {
        Self {
            step: ConversationStep::AwaitingUrl,
            records: Vec::new(),
            page_offset: 0,
            conversation: Conversation::new(max_history_turns),
        }
    }

    pub fn step(&self) -> &ConversationStep {
        &self.step
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn page_offset(&self) -> usize {
        self.page_offset
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Advances the conversation by one message.
    ///
    /// Extraction failures become the reply text; they never change the
    /// step, the collected records or the offset.
    pub async fn handle_message(&mut self, state: &AppState, message: &str) -> ChatReply {
        let Transition { next, action } = transition(&self.step, message);
        info!(
            "Chat step {} -> {} ({:?})",
            self.step.name(),
            next.name(),
            action
        );
        self.step = next;

        match action {
            Action::AskForCriteria => ChatReply::text(CRITERIA_PROMPT),
            Action::FirstBatch => {
                let batch = match self.run_batch(state, 0).await {
                    Ok(outcome) => outcome.render().unwrap_or_else(|| NO_MORE_RESORTS.to_string()),
                    Err(e) => {
                        log_failure(&e);
                        e.user_message()
                    }
                };
                ChatReply::text(format!("{}{}", SCHEMA_INTRO, batch))
            }
            Action::NextBatch => {
                let offset = self.page_offset + BATCH_SIZE;
                match self.run_batch(state, offset).await {
                    Ok(outcome) => {
                        self.page_offset = offset;
                        ChatReply::text(
                            outcome
                                .render()
                                .unwrap_or_else(|| NO_MORE_AFTER_CONTINUE.to_string()),
                        )
                    }
                    Err(e) => {
                        log_failure(&e);
                        ChatReply::text(e.user_message())
                    }
                }
            }
            Action::Consolidate => {
                info!("Consolidating {} collected records", self.records.len());
                let html = format!("{}{}", CONSOLIDATING_BANNER, consolidate(&self.records));
                self.reset();
                ChatReply {
                    html,
                    finished: true,
                }
            }
            Action::Remind => ChatReply::text(COMMAND_REMINDER),
        }
    }

    async fn run_batch(
        &mut self,
        state: &AppState,
        page_offset: usize,
    ) -> Result<BatchOutcome, ExtractionError> {
        let ConversationStep::Extracting { url, criteria } = &self.step else {
            return Err(ExtractionError::Service(anyhow::anyhow!(
                "no extraction in progress"
            )));
        };

        extract_batch(
            state,
            &mut self.conversation,
            &mut self.records,
            BatchContext {
                url,
                criteria,
                page_offset,
            },
        )
        .await
    }

    /// Back to the first step with nothing collected.
    pub fn reset(&mut self) {
        self.step = ConversationStep::AwaitingUrl;
        self.records.clear();
        self.page_offset = 0;
        self.conversation.clear();
    }
}

pub type SharedSession = Arc<Mutex<ChatSession>>;

/// A session looked up (or created) for one request.
pub struct SessionHandle {
    pub id: String,
    pub session: SharedSession,
    pub created: bool,
}

/// Chat sessions keyed by an opaque id, dropped after a period of inactivity.
#[derive(Clone)]
pub struct SessionStore {
    sessions: moka::future::Cache<String, SharedSession>,
    max_history_turns: usize,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("entries", &self.sessions.entry_count())
            .field("max_history_turns", &self.max_history_turns)
            .finish()
    }
}

impl SessionStore {
    pub fn new(idle_timeout: Duration, max_history_turns: usize) -> Self {
        Self {
            sessions: moka::future::Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle_timeout)
                .build(),
            max_history_turns,
        }
    }

    /// Starts a fresh session under a new id.
    pub async fn create(&self) -> SessionHandle {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(ChatSession::new(self.max_history_turns)));
        self.sessions.insert(id.clone(), session.clone()).await;
        info!("Created chat session {}", id);
        SessionHandle {
            id,
            session,
            created: true,
        }
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(id).await
    }

    /// The session for `id` if it is still alive, otherwise a new one.
    pub async fn get_or_create(&self, id: Option<&str>) -> SessionHandle {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                return SessionHandle {
                    id: id.to_string(),
                    session,
                    created: false,
                };
            }
        }
        self.create().await
    }

    pub async fn remove(&self, id: &str) {
        self.sessions.invalidate(id).await;
        info!("Closed chat session {}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_reuses_live_sessions() {
        let store = SessionStore::new(Duration::from_secs(60), 4);

        let first = store.get_or_create(None).await;
        assert!(first.created);

        let again = store.get_or_create(Some(&first.id)).await;
        assert!(!again.created);
        assert_eq!(again.id, first.id);
        assert!(Arc::ptr_eq(&again.session, &first.session));

        let unknown = store.get_or_create(Some("not-a-session")).await;
        assert!(unknown.created);
        assert_ne!(unknown.id, "not-a-session");
    }

    #[tokio::test]
    async fn test_remove_ends_session() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        let handle = store.create().await;

        store.remove(&handle.id).await;

        assert!(store.get(&handle.id).await.is_none());
        assert!(store.get_or_create(Some(&handle.id)).await.created);
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = SessionStore::new(Duration::from_millis(300), 4);
        let handle = store.create().await;
        assert!(store.get(&handle.id).await.is_some());

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(store.get(&handle.id).await.is_none());
        let next = store.get_or_create(Some(&handle.id)).await;
        assert!(next.created);
        assert_ne!(next.id, handle.id);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = ChatSession::new(4);
        session.step = ConversationStep::Extracting {
            url: "https://example.com".to_string(),
            criteria: "any".to_string(),
        };
        session.records.push(Record::new("Sol Mar"));
        session.page_offset = 40;
        session
            .conversation
            .push_turn("prompt".to_string(), "[]".to_string());

        session.reset();

        assert_eq!(session.step(), &ConversationStep::AwaitingUrl);
        assert!(session.records().is_empty());
        assert_eq!(session.page_offset(), 0);
        assert_eq!(session.conversation().turns(), 0);
    }
}
