//! Conversation store: single source of truth for the active session.
//!
//! Owns the ordered message list and the composing flag, persists every
//! successful append through `SessionStore`, and broadcasts a change event
//! so read-only views (metrics, document panels) refresh without coupling.
//!
//! Concurrency model: at most one in-flight `send` per session. A second
//! `send` while composing is rejected with `ChatError::Busy`. A `reset`
//! issued while an answer is outstanding bumps the session generation; the
//! late completion sees the stale generation and is discarded, so a cleared
//! session can never be resurrected.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::normalize::normalize_answer;
use super::ChatError;
use crate::backend::types::AnswerPayload;
use crate::backend::{BackendClient, BackendError};
use crate::models::Message;
use crate::storage::SessionStore;

/// Capacity of the change-notification channel. Consumers that lag simply
/// reload from the store, so losing events is acceptable.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Answer generation seam, implemented by `BackendClient` in production
/// and by fakes in tests.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    async fn answer(&self, query: &str) -> Result<AnswerPayload, BackendError>;
}

#[async_trait]
impl AnswerProvider for BackendClient {
    async fn answer(&self, query: &str) -> Result<AnswerPayload, BackendError> {
        BackendClient::answer(self, query).await
    }
}

/// Notification that the conversation history changed (append or reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    HistoryChanged,
}

struct Inner {
    messages: Vec<Message>,
    composing: bool,
    /// Bumped on every `reset`; an in-flight send carries the generation it
    /// started under and discards its result on mismatch.
    generation: u64,
}

/// Single source of truth for the active conversation.
pub struct ConversationStore {
    scope: String,
    provider: Arc<dyn AnswerProvider>,
    store: Arc<SessionStore>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    /// Create a store for a session scope, restoring any persisted history.
    pub fn new(
        scope: impl Into<String>,
        provider: Arc<dyn AnswerProvider>,
        store: Arc<SessionStore>,
    ) -> Self {
        let scope = scope.into();
        let messages = store.load_history(&scope);
        if !messages.is_empty() {
            tracing::info!(scope = %scope, count = messages.len(), "Restored conversation history");
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            scope,
            provider,
            store,
            inner: Mutex::new(Inner {
                messages,
                composing: false,
                generation: 0,
            }),
            events,
        }
    }

    // ── Read access ─────────────────────────────────────────

    /// Snapshot of the ordered message list.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Whether the assistant is currently composing an answer.
    pub fn is_composing(&self) -> bool {
        self.lock().composing
    }

    /// Subscribe to history-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    // ── Mutation ────────────────────────────────────────────

    /// Send user input and append the assistant's answer once it settles.
    ///
    /// Empty (after trim) input is a no-op. The user message is visible and
    /// persisted before the network call starts; exactly one assistant
    /// message follows: the normalized answer on success, a visible error
    /// message on failure. The composing flag is cleared on every exit path
    /// that still owns the session (a stale completion after `reset` leaves
    /// state to the reset).
    pub async fn send(&self, text: &str) -> Result<(), ChatError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let generation = {
            let mut inner = self.lock();
            if inner.composing {
                return Err(ChatError::Busy);
            }
            inner.composing = true;
            inner.messages.push(Message::user(trimmed));
            self.persist(&inner.messages);
            inner.generation
        };
        let _ = self.events.send(StoreEvent::HistoryChanged);

        let result = self.provider.answer(trimmed).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            // Session was reset while the answer was in flight.
            tracing::debug!(scope = %self.scope, "Discarding stale answer after reset");
            return Ok(());
        }
        inner.composing = false;

        let assistant = match result {
            Ok(payload) => {
                let normalized = normalize_answer(payload);
                Message::assistant(
                    normalized.text,
                    normalized.sources,
                    Some(normalized.confidence),
                )
            }
            Err(e) => {
                tracing::warn!(scope = %self.scope, error = %e, "Answer fetch failed");
                Message::assistant(format!("Sorry, there was an error: {e}"), Vec::new(), None)
            }
        };

        inner.messages.push(assistant);
        self.persist(&inner.messages);
        drop(inner);

        let _ = self.events.send(StoreEvent::HistoryChanged);
        Ok(())
    }

    /// Clear the session: in-memory history, persisted history, and any
    /// in-flight answer (via the generation bump). Idempotent.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            inner.messages.clear();
            inner.composing = false;
            inner.generation += 1;
        }
        if let Err(e) = self.store.clear_history(&self.scope) {
            tracing::warn!(scope = %self.scope, error = %e, "Failed to clear persisted history");
        }
        let _ = self.events.send(StoreEvent::HistoryChanged);
    }

    // ── Internal ────────────────────────────────────────────

    fn persist(&self, messages: &[Message]) {
        if let Err(e) = self.store.save_history(&self.scope, messages) {
            // The previous snapshot stays readable; history is re-persisted
            // on the next append.
            tracing::warn!(scope = %self.scope, error = %e, "Failed to persist history");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-append; propagating the panic
        // is the only sound option for in-memory UI state.
        self.inner.lock().expect("conversation store lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::RawSource;
    use crate::config;
    use crate::models::Sender;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    /// Scripted provider: pops one response per call, optionally parking
    /// until released so tests can interleave resets.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<AnswerPayload, BackendError>>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<AnswerPayload, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                gate: None,
            })
        }

        fn gated(
            responses: Vec<Result<AnswerPayload, BackendError>>,
            gate: Arc<Notify>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                gate: Some(gate),
            })
        }
    }

    #[async_trait]
    impl AnswerProvider for ScriptedProvider {
        async fn answer(&self, _query: &str) -> Result<AnswerPayload, BackendError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
        }
    }

    fn answer_payload(text: &str, confidence: Option<f64>) -> AnswerPayload {
        AnswerPayload {
            answer: Some(text.into()),
            sources: vec![RawSource {
                text: Some("relevant chunk".into()),
                relevance_score: Some(0.8),
                ..Default::default()
            }],
            confidence,
        }
    }

    fn new_store(provider: Arc<dyn AnswerProvider>) -> ConversationStore {
        let session = Arc::new(SessionStore::open_in_memory().unwrap());
        ConversationStore::new("test", provider, session)
    }

    #[tokio::test]
    async fn send_appends_user_then_assistant() {
        let provider = ScriptedProvider::new(vec![Ok(answer_payload("The answer.", Some(0.9)))]);
        let store = new_store(provider);

        store.send("What is the governing law?").await.unwrap();

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].content, "What is the governing law?");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].content, "The answer.");
        assert_eq!(messages[1].confidence, Some(90));
        assert_eq!(messages[1].sources.len(), 1);
        assert!(!store.is_composing());
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let provider = ScriptedProvider::new(vec![]);
        let store = new_store(provider);

        store.send("").await.unwrap();
        store.send("   \n\t ").await.unwrap();

        assert!(store.messages().is_empty());
        assert!(!store.is_composing());
    }

    #[tokio::test]
    async fn input_is_trimmed_before_appending() {
        let provider = ScriptedProvider::new(vec![Ok(answer_payload("ok", None))]);
        let store = new_store(provider);

        store.send("  hello  ").await.unwrap();
        assert_eq!(store.messages()[0].content, "hello");
    }

    #[tokio::test]
    async fn failure_appends_visible_error_message() {
        let provider = ScriptedProvider::new(vec![Err(BackendError::Api {
            status: 503,
            message: "model overloaded".into(),
        })]);
        let store = new_store(provider);

        store.send("anything").await.unwrap();

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].content, "Sorry, there was an error: model overloaded");
        assert!(messages[1].sources.is_empty());
        assert_eq!(messages[1].confidence, None);
        assert!(!store.is_composing(), "composing must clear on failure");
    }

    #[tokio::test]
    async fn missing_backend_confidence_gets_default() {
        let provider = ScriptedProvider::new(vec![Ok(answer_payload("ok", None))]);
        let store = new_store(provider);

        store.send("q").await.unwrap();
        assert_eq!(store.messages()[1].confidence, Some(config::DEFAULT_CONFIDENCE));
    }

    #[tokio::test]
    async fn concurrent_send_is_rejected() {
        let gate = Arc::new(Notify::new());
        let provider = ScriptedProvider::gated(
            vec![Ok(answer_payload("late answer", Some(0.5)))],
            Arc::clone(&gate),
        );
        let store = Arc::new(new_store(provider));

        let first = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send("first").await })
        };
        // Let the first send reach the await point.
        tokio::task::yield_now().await;
        assert!(store.is_composing());

        let second = store.send("second").await;
        assert!(matches!(second, Err(ChatError::Busy)));

        gate.notify_one();
        first.await.unwrap().unwrap();

        // Exactly one user + one assistant message.
        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
    }

    #[tokio::test]
    async fn reset_discards_in_flight_answer() {
        let gate = Arc::new(Notify::new());
        let provider = ScriptedProvider::gated(
            vec![Ok(answer_payload("stale answer", Some(0.9)))],
            Arc::clone(&gate),
        );
        let session = Arc::new(SessionStore::open_in_memory().unwrap());
        let store = Arc::new(ConversationStore::new(
            "test",
            provider,
            Arc::clone(&session),
        ));

        let pending = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send("doomed question").await })
        };
        tokio::task::yield_now().await;
        assert_eq!(store.messages().len(), 1);

        store.reset();
        gate.notify_one();
        pending.await.unwrap().unwrap();

        // The stale answer must not resurrect the cleared session.
        assert!(store.messages().is_empty());
        assert!(session.load_history("test").is_empty());
        assert!(!store.is_composing());
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let provider = ScriptedProvider::new(vec![Ok(answer_payload("a", Some(0.7)))]);
        let store = new_store(provider);

        store.send("q").await.unwrap();
        assert_eq!(store.messages().len(), 2);

        store.reset();
        store.reset();

        assert!(store.messages().is_empty());
        assert!(!store.is_composing());
    }

    #[tokio::test]
    async fn history_persists_and_restores() {
        let session = Arc::new(SessionStore::open_in_memory().unwrap());
        let provider = ScriptedProvider::new(vec![Ok(answer_payload("persisted", Some(0.66)))]);
        let store = ConversationStore::new("test", provider, Arc::clone(&session));

        store.send("will this survive?").await.unwrap();
        let before = store.messages();
        drop(store);

        let provider = ScriptedProvider::new(vec![]);
        let revived = ConversationStore::new("test", provider, session);
        assert_eq!(revived.messages(), before);
    }

    #[tokio::test]
    async fn user_message_persisted_before_answer_settles() {
        let gate = Arc::new(Notify::new());
        let provider = ScriptedProvider::gated(
            vec![Ok(answer_payload("ok", None))],
            Arc::clone(&gate),
        );
        let session = Arc::new(SessionStore::open_in_memory().unwrap());
        let store = Arc::new(ConversationStore::new(
            "test",
            provider,
            Arc::clone(&session),
        ));

        let pending = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send("early visibility").await })
        };
        tokio::task::yield_now().await;

        let persisted = session.load_history("test");
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].content, "early visibility");

        gate.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(session.load_history("test").len(), 2);
    }

    #[tokio::test]
    async fn change_events_fire_on_append_and_reset() {
        let provider = ScriptedProvider::new(vec![Ok(answer_payload("a", Some(0.5)))]);
        let store = new_store(provider);
        let mut events = store.subscribe();

        store.send("q").await.unwrap();
        store.reset();

        // Two appends (user, assistant) + one reset.
        let mut seen = 0;
        while events.try_recv().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[tokio::test]
    async fn messages_are_strictly_append_ordered() {
        let provider = ScriptedProvider::new(vec![
            Ok(answer_payload("one", Some(0.5))),
            Ok(answer_payload("two", Some(0.5))),
        ]);
        let store = new_store(provider);

        store.send("first").await.unwrap();
        store.send("second").await.unwrap();

        let messages = store.messages();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "one", "second", "two"]);

        let timestamps: Vec<_> = messages.iter().map(|m| m.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
    }
}
