//! Conversation engine: normalization, state, and attribution.
//!
//! Data flow: user input → `ConversationStore::send` appends a user message
//! → backend answer call → `normalize` turns the raw payload into text +
//! sources + confidence → the store appends the assistant message and
//! persists the full history → `attribution` and `metrics` read that
//! history to drive auxiliary views.

pub mod attribution;
pub mod normalize;
pub mod store;

pub use attribution::{displayed_confidence, is_no_answer, shows_sources, ConfidenceBand, SourcePanel};
pub use normalize::{normalize_answer, NormalizedAnswer};
pub use store::{AnswerProvider, ConversationStore, StoreEvent};

use thiserror::Error;

/// Errors surfaced by the conversation store.
#[derive(Error, Debug)]
pub enum ChatError {
    /// A second `send` arrived while an answer was still being generated.
    /// The design allows at most one in-flight send per session.
    #[error("An answer is already being generated, wait for it to finish")]
    Busy,
}
