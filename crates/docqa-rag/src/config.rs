//! Configuration for the document QA pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Refusal policy configuration
    #[serde(default)]
    pub refusal: RefusalConfig,
    /// Citation configuration
    #[serde(default)]
    pub citations: CitationConfig,
    /// Index storage configuration
    #[serde(default)]
    pub index: IndexConfig,
}

impl RagConfig {
    /// Validate parameter sanity across all sections
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.refusal.validate()?;
        self.citations.validate()?;
        Ok(())
    }
}

/// Chunking configuration
///
/// Sizes are measured in grapheme clusters so multi-byte text chunks
/// the same way short ASCII does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size (default: 1000)
    #[serde(default = "default_chunk_max_size")]
    pub max_size: usize,
    /// Overlap between consecutive chunks (default: 150)
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
    /// Minimum size of non-final chunks; the final chunk of a document
    /// may be shorter (default: 100)
    #[serde(default = "default_chunk_min_size")]
    pub min_size: usize,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::config("chunking.max_size must be greater than zero"));
        }
        if self.overlap >= self.max_size {
            return Err(Error::config(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                self.overlap, self.max_size
            )));
        }
        if self.min_size > self.max_size {
            return Err(Error::config(format!(
                "chunking.min_size ({}) must not exceed chunking.max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: default_chunk_max_size(),
            overlap: default_chunk_overlap(),
            min_size: default_chunk_min_size(),
        }
    }
}

fn default_chunk_max_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 150 }
fn default_chunk_min_size() -> usize { 100 }

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks returned per query (default: 5)
    #[serde(default = "default_top_k")]
    pub k: usize,
    /// Candidate pool size for diversity selection.
    /// `None` resolves to `max(20, 4 * k)`.
    #[serde(default)]
    pub fetch_k: Option<usize>,
    /// Apply maximal-marginal-relevance re-ranking (default: true)
    #[serde(default = "default_use_mmr")]
    pub use_mmr: bool,
    /// Relevance/diversity trade-off, 1.0 = pure relevance (default: 0.5)
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,
}

impl RetrievalConfig {
    /// Resolve the candidate pool size for a given `k`
    pub fn resolved_fetch_k(&self, k: usize) -> usize {
        match self.fetch_k {
            Some(fetch_k) => fetch_k.max(k),
            None => 20.max(k * 4),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::config("retrieval.k must be greater than zero"));
        }
        if let Some(fetch_k) = self.fetch_k {
            if fetch_k < self.k {
                return Err(Error::config(format!(
                    "retrieval.fetch_k ({}) must be at least retrieval.k ({})",
                    fetch_k, self.k
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(Error::config(format!(
                "retrieval.mmr_lambda ({}) must be within [0, 1]",
                self.mmr_lambda
            )));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_top_k(),
            fetch_k: None,
            use_mmr: default_use_mmr(),
            mmr_lambda: default_mmr_lambda(),
        }
    }
}

fn default_top_k() -> usize { 5 }
fn default_use_mmr() -> bool { true }
fn default_mmr_lambda() -> f32 { 0.5 }

/// Refusal policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefusalConfig {
    /// Minimum cosine similarity any retrieved chunk must reach,
    /// otherwise the question is refused before generation (default: 0.25)
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Minimum total trimmed evidence length; 0 disables the gate
    /// (default: 0, disabled)
    #[serde(default = "default_min_evidence_chars")]
    pub min_evidence_chars: usize,
    /// Phrases that mark a generated answer as a refusal,
    /// matched case-insensitively
    #[serde(default = "default_refusal_markers")]
    pub markers: Vec<String>,
}

impl RefusalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.markers.is_empty() {
            return Err(Error::config("refusal.markers must not be empty"));
        }
        Ok(())
    }
}

impl Default for RefusalConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            min_evidence_chars: default_min_evidence_chars(),
            markers: default_refusal_markers(),
        }
    }
}

fn default_score_threshold() -> f32 { 0.25 }
fn default_min_evidence_chars() -> usize { 0 }
fn default_refusal_markers() -> Vec<String> {
    vec![
        "insufficient evidence in the provided documents".to_string(),
        "insufficient evidence".to_string(),
    ]
}

/// Citation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Maximum citations per answer, applied after deduplication
    /// (default: 6)
    #[serde(default = "default_max_citations")]
    pub max_citations: usize,
    /// Maximum excerpt length in bytes, truncated at a word boundary
    /// (default: 240)
    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,
}

impl CitationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_citations == 0 {
            return Err(Error::config("citations.max_citations must be greater than zero"));
        }
        if self.excerpt_max_chars == 0 {
            return Err(Error::config("citations.excerpt_max_chars must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            max_citations: default_max_citations(),
            excerpt_max_chars: default_excerpt_max_chars(),
        }
    }
}

fn default_max_citations() -> usize { 6 }
fn default_excerpt_max_chars() -> usize { 240 }

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the persisted index snapshot
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
        }
    }
}

fn default_index_dir() -> PathBuf { PathBuf::from("./.index") }
