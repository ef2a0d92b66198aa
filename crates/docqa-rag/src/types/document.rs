//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Source document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain text
    Text,
    /// Markdown
    Markdown,
}

impl DocumentFormat {
    /// Map a file extension to a format; `None` means the file is skipped
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Markdown => "Markdown",
        }
    }
}

/// A source document: raw text plus file-level metadata.
/// Immutable once ingested; replaced wholesale on re-ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the ingestion root, `/`-separated for portability
    pub source_path: String,
    /// Detected format
    pub format: DocumentFormat,
    /// Full document text
    pub text: String,
    /// Ingestion timestamp
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// Create a document stamped with the current time
    pub fn new(source_path: impl Into<String>, format: DocumentFormat, text: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            format,
            text: text.into(),
            ingested_at: Utc::now(),
        }
    }
}

/// A contiguous span of a document, the atomic unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id derived from source, position, and content
    pub id: String,
    /// Exact text slice of the source document
    pub text: String,
    /// Source document path
    pub source_path: String,
    /// Ordinal of this chunk within its document
    pub position_index: usize,
    /// Byte offset of the chunk start, aligned to a grapheme boundary
    pub char_start: usize,
    /// Byte offset one past the chunk end, aligned to a grapheme boundary
    pub char_end: usize,
}

impl Chunk {
    /// Create a chunk with a derived id
    pub fn new(
        text: impl Into<String>,
        source_path: impl Into<String>,
        position_index: usize,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        let text = text.into();
        let source_path = source_path.into();
        let id = derive_chunk_id(&source_path, position_index, &text);

        Self {
            id,
            text,
            source_path,
            position_index,
            char_start,
            char_end,
        }
    }
}

/// First 12 hex characters of SHA-256 over the source path, the chunk
/// ordinal, and a bounded text prefix. Identical content yields the same
/// id; edits change it.
pub fn derive_chunk_id(source_path: &str, position_index: usize, text: &str) -> String {
    let prefix_end = text
        .grapheme_indices(true)
        .nth(200)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len());

    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    hasher.update(b"|");
    hasher.update(position_index.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(text[..prefix_end].as_bytes());

    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
