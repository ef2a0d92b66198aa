//! In-memory vector index with exact cosine search

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

/// Identity of the configuration an index was built under.
///
/// Persisted alongside the chunks and compared on load and on every
/// query: an index built under configuration A must never be silently
/// queried as if built under configuration B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Embedding provider name
    pub provider: String,
    /// Embedding dimension count
    pub dimensions: usize,
    /// Chunk size the corpus was split with
    pub chunk_max_size: usize,
    /// Chunk overlap the corpus was split with
    pub chunk_overlap: usize,
    /// Build timestamp, not part of the identity check
    pub built_at: DateTime<Utc>,
}

impl IndexDescriptor {
    /// Describe the configuration a provider + chunking pair would build
    pub fn new(provider: &dyn EmbeddingProvider, chunking: &ChunkingConfig) -> Self {
        Self {
            provider: provider.name().to_string(),
            dimensions: provider.dimensions(),
            chunk_max_size: chunking.max_size,
            chunk_overlap: chunking.overlap,
            built_at: Utc::now(),
        }
    }

    /// Compact identity string for logs and mismatch errors
    pub fn identity(&self) -> String {
        format!(
            "provider={} dims={} chunk_size={} overlap={}",
            self.provider, self.dimensions, self.chunk_max_size, self.chunk_overlap
        )
    }

    /// Compare identity fields, ignoring `built_at`
    pub fn matches(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.dimensions == other.dimensions
            && self.chunk_max_size == other.chunk_max_size
            && self.chunk_overlap == other.chunk_overlap
    }

    /// Reject `found` unless it carries the same identity
    pub fn ensure_matches(&self, found: &Self) -> Result<()> {
        if self.matches(found) {
            Ok(())
        } else {
            Err(Error::ConfigMismatch {
                expected: self.identity(),
                found: found.identity(),
            })
        }
    }
}

/// A retrieval result element: a chunk with its relevance score
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query
    pub score: f32,
}

/// A search candidate retaining its embedding for diversity re-ranking
#[derive(Debug, Clone)]
pub(crate) struct ScoredCandidate {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
    pub score: f32,
}

/// The full `(chunk, embedding)` collection plus its build identity
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorIndex {
    descriptor: IndexDescriptor,
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embed and index chunks.
    ///
    /// Fails the whole build on any provider error, a missing vector, or
    /// a vector whose length disagrees with the provider's dimension
    /// count: a partially embedded index is unsafe to query.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        chunking: &ChunkingConfig,
    ) -> Result<Self> {
        let descriptor = IndexDescriptor::new(provider, chunking);

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            provider.embed_batch(&texts).await?
        };

        if embeddings.len() != chunks.len() {
            return Err(Error::provider(
                provider.name(),
                format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }
        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            if embedding.len() != descriptor.dimensions {
                return Err(Error::provider(
                    provider.name(),
                    format!(
                        "embedding for chunk {} has {} dimensions, expected {}",
                        chunk.id,
                        embedding.len(),
                        descriptor.dimensions
                    ),
                ));
            }
        }

        info!(
            chunks = chunks.len(),
            provider = provider.name(),
            dimensions = descriptor.dimensions,
            "built vector index"
        );

        Ok(Self {
            descriptor,
            chunks,
            embeddings,
        })
    }

    /// Build identity of this index
    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when the corpus produced no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Exact top-`n` cosine search; scores are non-increasing
    pub fn query_vectors(&self, query: &[f32], n: usize) -> Vec<RetrievedChunk> {
        self.query_candidates(query, n)
            .into_iter()
            .map(|c| RetrievedChunk {
                chunk: c.chunk,
                score: c.score,
            })
            .collect()
    }

    /// Top-`n` candidates with their embeddings, for diversity re-ranking
    pub(crate) fn query_candidates(&self, query: &[f32], n: usize) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = self
            .chunks
            .iter()
            .zip(&self.embeddings)
            .map(|(chunk, embedding)| ScoredCandidate {
                chunk: chunk.clone(),
                embedding: embedding.clone(),
                score: cosine_similarity(query, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);
        scored
    }

    /// Verify internal consistency after deserializing a snapshot
    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.chunks.len() != self.embeddings.len() {
            return Err(Error::index(format!(
                "snapshot holds {} chunks but {} embeddings",
                self.chunks.len(),
                self.embeddings.len()
            )));
        }
        if let Some(bad) = self
            .embeddings
            .iter()
            .find(|e| e.len() != self.descriptor.dimensions)
        {
            return Err(Error::index(format!(
                "snapshot embedding has {} dimensions, descriptor says {}",
                bad.len(),
                self.descriptor.dimensions
            )));
        }
        Ok(())
    }
}

/// Cosine similarity with a zero-norm guard: a zero vector is similar
/// to nothing, not NaN-similar to everything.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
