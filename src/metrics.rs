//! Read-only statistics derived from persisted conversation history.
//!
//! Feeds the knowledge-hub stat cards. Never mutates history and never
//! fails: a missing or corrupted blob reads as an empty history, which
//! yields zero queries and an unavailable average.

use crate::chat::attribution::displayed_confidence;
use crate::models::{Message, Sender};
use crate::storage::SessionStore;

/// Aggregates over one session's history.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetrics {
    /// Number of user messages (questions asked).
    pub query_count: usize,
    /// Mean of per-message best confidence over eligible assistant
    /// messages, rounded to one decimal. `None` means unavailable, meaning there
    /// were no eligible messages. Never 0.0 as a stand-in for "unknown".
    pub average_confidence: Option<f64>,
    /// How many assistant messages entered the average.
    pub rated_answers: usize,
}

impl SessionMetrics {
    /// Compute metrics from the persisted history of a session scope.
    pub fn from_store(store: &SessionStore, scope: &str) -> Self {
        Self::from_history(&store.load_history(scope))
    }

    /// Compute metrics from an in-memory history.
    ///
    /// Eligibility for the average follows the attribution rules: assistant
    /// messages only, no-answer messages excluded, each contributing its
    /// best confidence (max source confidence, else message confidence).
    pub fn from_history(messages: &[Message]) -> Self {
        let query_count = messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .count();

        let confidences: Vec<u8> = messages
            .iter()
            .filter(|m| m.sender == Sender::Assistant)
            .filter_map(displayed_confidence)
            .collect();

        let average_confidence = if confidences.is_empty() {
            None
        } else {
            let sum: u32 = confidences.iter().map(|&c| c as u32).sum();
            let mean = sum as f64 / confidences.len() as f64;
            Some((mean * 10.0).round() / 10.0)
        };

        Self {
            query_count,
            average_confidence,
            rated_answers: confidences.len(),
        }
    }
}
