//! Query-time retrieval over a built index

use std::sync::Arc;

use tracing::debug;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

use super::index::{RetrievedChunk, VectorIndex};
use super::mmr::mmr_rerank;

/// Embeds queries and searches an index, optionally re-ranking for
/// diversity. Holds the provider so every query is embedded by the same
/// provider the index was built with.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: RetrievalConfig) -> Self {
        Self { embedder, config }
    }

    /// Top-`k` chunks for `query_text`, most relevant first.
    ///
    /// A provider failure surfaces as an error; an empty vector means
    /// the corpus had nothing to offer, never that the call failed.
    /// With diversity on, `fetch_k` candidates are fetched first and
    /// `k` are selected from them by marginal relevance.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query_text: &str,
        k: usize,
        use_mmr: bool,
        fetch_k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        self.check_compatibility(index)?;

        if k == 0 || index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(query_text).await?;

        if !use_mmr {
            return Ok(index.query_vectors(&query, k));
        }

        let pool = match fetch_k {
            Some(requested) => requested.max(k),
            None => self.config.resolved_fetch_k(k),
        };
        debug!(k, pool, lambda = self.config.mmr_lambda, "retrieving with diversity");

        let candidates = index.query_candidates(&query, pool);
        Ok(mmr_rerank(candidates, k, self.config.mmr_lambda))
    }

    /// The index must have been built by this provider at this dimension
    fn check_compatibility(&self, index: &VectorIndex) -> Result<()> {
        let descriptor = index.descriptor();
        if descriptor.provider != self.embedder.name()
            || descriptor.dimensions != self.embedder.dimensions()
        {
            return Err(Error::ConfigMismatch {
                expected: descriptor.identity(),
                found: format!(
                    "provider={} dims={}",
                    self.embedder.name(),
                    self.embedder.dimensions()
                ),
            });
        }
        Ok(())
    }
}
