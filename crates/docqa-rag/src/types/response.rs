//! Answer, citation, and structured response types

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// Canonical refusal text. The evaluation harness compares against this
/// byte-for-byte, so it must never be reworded casually.
pub const REFUSAL_TEXT: &str = "Insufficient evidence in the provided documents.";

/// Citation pointing at a retrieved chunk.
///
/// Serialized field names (`source`, `chunk`, `excerpt`) are the wire
/// contract checked by the schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source document path
    #[serde(rename = "source")]
    pub source_path: String,
    /// Chunk ordinal within the source document
    #[serde(rename = "chunk")]
    pub position_index: usize,
    /// Short excerpt from the cited chunk
    pub excerpt: String,
}

impl Citation {
    /// Create a citation from a chunk and a pre-built excerpt
    pub fn from_chunk(chunk: &Chunk, excerpt: String) -> Self {
        Self {
            source_path: chunk.source_path.clone(),
            position_index: chunk.position_index,
            excerpt,
        }
    }

    /// Identity used for deduplication
    pub fn key(&self) -> (&str, usize) {
        (self.source_path.as_str(), self.position_index)
    }

    /// Format for the sources footer
    pub fn format_inline(&self) -> String {
        format!("{}#{}", self.source_path, self.position_index)
    }
}

/// Final answer state.
///
/// `refused` is never set independently: `refusal()` pins the text to
/// [`REFUSAL_TEXT`] with no citations, and `grounded()` requires
/// citations. The schema validator re-checks the pairing on every
/// structured response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Rendered answer text
    pub text: String,
    /// Citations backing the answer, first-seen order
    pub citations: Vec<Citation>,
    /// Whether this is the canonical refusal
    pub refused: bool,
}

impl Answer {
    /// The canonical refusal: fixed text, no citations
    pub fn refusal() -> Self {
        Self {
            text: REFUSAL_TEXT.to_string(),
            citations: Vec::new(),
            refused: true,
        }
    }

    /// An evidence-grounded answer
    pub fn grounded(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        debug_assert!(!citations.is_empty(), "grounded answers carry citations");
        Self {
            text: text.into(),
            citations,
            refused: false,
        }
    }
}

/// Schema-validated JSON rendering of an [`Answer`].
///
/// `answer`, `citations`, and `refused` are the response contract;
/// `confidence` is an auxiliary retrieval-strength score in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// Answer text
    pub answer: String,
    /// Citations in wire format
    pub citations: Vec<Citation>,
    /// Whether the answer is the canonical refusal
    pub refused: bool,
    /// Retrieval-strength score in [0, 1]
    pub confidence: f32,
}
