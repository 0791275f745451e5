//! Source attribution: what confidence to surface, whether to offer sources.
//!
//! The badge value and the sources affordance are derived per message, never
//! stored; the rules here are the single place the UI asks.

use serde::Serialize;

use crate::config;
use crate::models::{Message, Sender, SourceReference};

/// Detect a "no relevant information" answer.
///
/// Matched case-insensitively anywhere in the content. Such messages
/// suppress both the confidence badge and the sources affordance even when
/// sources are attached. Retrieval hits behind a non-answer are noise.
pub fn is_no_answer(message: &Message) -> bool {
    message
        .content
        .to_lowercase()
        .contains(config::NO_ANSWER_SENTINEL)
}

/// Confidence value to show on a message's badge, if any.
///
/// Selection order: the maximum confidence over attached sources, then the
/// message-level confidence, then nothing. Selection feeds the badge only;
/// sources are always displayed in retrieval order.
pub fn displayed_confidence(message: &Message) -> Option<u8> {
    if message.sender != Sender::Assistant || is_no_answer(message) {
        return None;
    }

    let best_source = message
        .sources
        .iter()
        .filter_map(|source| source.confidence)
        .max();

    best_source.or(message.confidence)
}

/// Whether the "Sources" affordance is shown for a message.
pub fn shows_sources(message: &Message) -> bool {
    message.sender == Sender::Assistant
        && !is_no_answer(message)
        && !message.sources.is_empty()
}

/// Presentation tier for a confidence percentage.
///
/// Bands are inclusive at the lower bound, exclusive at the upper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// ≥ 90
    High,
    /// 70–89
    MediumHigh,
    /// 50–69
    MediumLow,
    /// < 50
    Low,
}

impl ConfidenceBand {
    pub fn from_percent(confidence: u8) -> Self {
        match confidence {
            90..=u8::MAX => Self::High,
            70..=89 => Self::MediumHigh,
            50..=69 => Self::MediumLow,
            _ => Self::Low,
        }
    }
}

/// Inspection panel state for a message's sources.
///
/// The panel borrows nothing: opening it snapshots the source list, so a
/// session reset cannot invalidate what the user is reading.
#[derive(Debug, Default)]
pub struct SourcePanel {
    selected: Option<Vec<SourceReference>>,
    open: bool,
}

impl SourcePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the panel on a message's sources.
    pub fn open(&mut self, sources: Vec<SourceReference>) {
        self.selected = Some(sources);
        self.open = true;
    }

    /// Close the panel. The selection is kept so a re-open without a new
    /// pick shows the same sources.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Clear panel state entirely (session reset).
    pub fn reset(&mut self) {
        self.selected = None;
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn selected(&self) -> Option<&[SourceReference]> {
        self.selected.as_deref()
    }
}
