//! Answer composition and the layered refusal policy
//!
//! Refusal happens at two points. Before generation: empty retrieval,
//! uniformly weak scores, or too little evidence text refuses without
//! ever calling the model. After generation: a failed call, a model
//! that itself declined, or an answer carrying no valid citation all
//! collapse to the same canonical refusal. Every refusal path produces
//! byte-identical output.

use tracing::{debug, warn};

use crate::config::{CitationConfig, RefusalConfig};
use crate::retrieval::RetrievedChunk;
use crate::types::Answer;

use super::citation::extract_citations;

/// Confidence ceiling for refusals
pub const REFUSAL_CONFIDENCE_CAP: f32 = 0.25;

/// Confidence reported when generation itself failed
pub const FAILURE_CONFIDENCE: f32 = 0.1;

/// Turns raw model output into a final [`Answer`], refusing whenever
/// the evidence or the output does not hold up.
pub struct AnswerComposer {
    refusal: RefusalConfig,
    citations: CitationConfig,
}

impl AnswerComposer {
    pub fn new(refusal: RefusalConfig, citations: CitationConfig) -> Self {
        Self { refusal, citations }
    }

    /// Pre-generation gate. True when the retrieved evidence is worth
    /// sending to the model at all: at least one chunk, at least one
    /// score at or above the threshold, and enough total evidence text.
    pub fn evidence_is_sufficient(&self, results: &[RetrievedChunk]) -> bool {
        if results.is_empty() {
            debug!("refusing before generation: no chunks retrieved");
            return false;
        }
        if results.iter().all(|r| r.score < self.refusal.score_threshold) {
            debug!(
                threshold = self.refusal.score_threshold,
                "refusing before generation: all scores below threshold"
            );
            return false;
        }

        let evidence_chars: usize = results.iter().map(|r| r.chunk.text.trim().len()).sum();
        if evidence_chars < self.refusal.min_evidence_chars {
            debug!(
                evidence_chars,
                required = self.refusal.min_evidence_chars,
                "refusing before generation: evidence too thin"
            );
            return false;
        }
        true
    }

    /// Post-generation composition.
    ///
    /// A raw answer survives only if it is non-empty, is not itself a
    /// refusal, and cites at least one retrieved chunk. Anything else
    /// becomes the canonical refusal. `no_citations` suppresses only
    /// the rendered sources footer; citation records stay attached.
    pub fn finalize(
        &self,
        raw: &str,
        retrieved: &[RetrievedChunk],
        no_citations: bool,
    ) -> Answer {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            warn!("model returned empty output, refusing");
            return Answer::refusal();
        }
        if self.is_refusal_text(trimmed) {
            debug!("model declined to answer");
            return Answer::refusal();
        }

        let citations = extract_citations(
            trimmed,
            retrieved,
            self.citations.max_citations,
            self.citations.excerpt_max_chars,
        );
        if citations.is_empty() {
            // An uncited answer cannot be traced back to evidence
            warn!("answer carried no valid citation markers, refusing");
            return Answer::refusal();
        }

        let text = if no_citations {
            trimmed.to_string()
        } else {
            render_with_sources(trimmed, &citations)
        };
        Answer::grounded(text, citations)
    }

    /// Case-insensitive scan for configured refusal phrases
    fn is_refusal_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.refusal
            .markers
            .iter()
            .any(|m| lower.contains(&m.to_lowercase()))
    }
}

/// Append the sources footer listing each citation once
fn render_with_sources(answer: &str, citations: &[crate::types::Citation]) -> String {
    let mut rendered = String::from(answer);
    rendered.push_str("\n\nSources:");
    for citation in citations {
        rendered.push_str(&format!("\n- {}", citation.format_inline()));
    }
    rendered
}

/// Retrieval-strength confidence: the mean of the top five scores,
/// each clamped to [0, 1], discounted and clamped again.
pub fn confidence_from_scores(results: &[RetrievedChunk]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }

    let top: Vec<f32> = results
        .iter()
        .take(5)
        .map(|r| r.score.clamp(0.0, 1.0))
        .collect();
    let mean = top.iter().sum::<f32>() / top.len() as f32;
    (mean * 0.95).clamp(0.0, 1.0)
}
