//! Response normalization: raw answer payload → typed message parts.
//!
//! Pure transformation, no I/O. Network and parse failures never reach
//! this module; the conversation store converts those into visible error
//! messages before normalization would run.

use crate::backend::types::{AnswerPayload, RawSource};
use crate::config;
use crate::models::SourceReference;

/// A backend answer reduced to what an assistant message carries.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAnswer {
    pub text: String,
    pub sources: Vec<SourceReference>,
    /// Always set: backend fraction converted to 0–100, or the optimistic
    /// default when the backend omitted confidence entirely.
    pub confidence: u8,
}

/// Normalize a raw answer payload.
///
/// - Missing or empty answer text is replaced by a fixed fallback string.
/// - Relevance fractions become integer percentages; an unscored source
///   keeps `confidence = None` rather than 0.
/// - A missing message-level confidence becomes [`config::DEFAULT_CONFIDENCE`].
pub fn normalize_answer(payload: AnswerPayload) -> NormalizedAnswer {
    let text = match payload.answer {
        Some(answer) if !answer.is_empty() => answer,
        _ => config::FALLBACK_ANSWER.to_string(),
    };

    let sources = payload.sources.into_iter().map(normalize_source).collect();

    let confidence = payload
        .confidence
        .map(to_percent)
        .unwrap_or(config::DEFAULT_CONFIDENCE);

    NormalizedAnswer {
        text,
        sources,
        confidence,
    }
}

fn normalize_source(raw: RawSource) -> SourceReference {
    SourceReference {
        excerpt: raw.text.unwrap_or_default(),
        confidence: raw.relevance_score.map(to_percent),
        distance: raw.cosine_distance,
        metadata: raw.metadata,
    }
}

/// Convert a [0, 1] fraction to an integer percentage, rounding to the
/// nearest integer and clamping out-of-range input.
fn to_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}
