//! The document QA pipeline facade
//!
//! Wires ingestion, indexing, retrieval, and generation behind a small
//! surface: build or load an index, then answer questions against it.
//! Provider outages at query time degrade to refusals; configuration
//! and index-state errors propagate to the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::eval::{self, EvalCase, EvalReport};
use crate::generation::composer::{FAILURE_CONFIDENCE, REFUSAL_CONFIDENCE_CAP};
use crate::generation::{confidence_from_scores, AnswerComposer, PromptBuilder};
use crate::ingestion::{load_documents, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::index::IndexDescriptor;
use crate::retrieval::{store, IndexHandle, Retriever, VectorIndex};
use crate::schema;
use crate::types::{Answer, StructuredResponse};

/// Per-query overrides; unset fields fall back to configuration
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Number of chunks to retrieve
    pub k: Option<usize>,
    /// Apply diversity re-ranking
    pub use_mmr: Option<bool>,
    /// Candidate pool size for diversity selection
    pub fetch_k: Option<usize>,
    /// Suppress the rendered sources footer. Citation records stay
    /// attached to the answer either way.
    pub no_citations: bool,
}

/// End-to-end question answering over a document corpus
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    retriever: Retriever,
    composer: AnswerComposer,
    handle: IndexHandle,
}

impl RagPipeline {
    /// Create a pipeline. Fails on invalid configuration.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let retriever = Retriever::new(embedder.clone(), config.retrieval.clone());
        let composer = AnswerComposer::new(config.refusal.clone(), config.citations.clone());

        info!(
            embedder = embedder.name(),
            llm = llm.name(),
            model = llm.model(),
            "pipeline ready"
        );
        Ok(Self {
            config,
            embedder,
            llm,
            retriever,
            composer,
            handle: IndexHandle::new(),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Currently active index, if any
    pub fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.handle.current()
    }

    /// Build the index from the documents under `docs_root`, or load
    /// the persisted snapshot when one exists and `rebuild` is false.
    ///
    /// A snapshot built under a different configuration is rejected,
    /// never silently rebuilt. Queries running concurrently keep being
    /// served by the previous index until the swap at the end.
    pub async fn build_or_load_index(
        &self,
        docs_root: &Path,
        rebuild: bool,
    ) -> Result<Arc<VectorIndex>> {
        let _guard = self.handle.begin_rebuild().await;

        let index_dir = self.config.index.dir.as_path();
        let descriptor = IndexDescriptor::new(self.embedder.as_ref(), &self.config.chunking);

        if !rebuild && store::exists(index_dir) {
            let index = Arc::new(store::load(index_dir, &descriptor)?);
            self.handle.replace(index.clone());
            return Ok(index);
        }

        let outcome = load_documents(docs_root)?;
        if outcome.documents.is_empty() && !outcome.skipped.is_empty() {
            return Err(Error::ingestion(
                docs_root.display().to_string(),
                format!(
                    "all {} candidate documents failed to load",
                    outcome.skipped.len()
                ),
            ));
        }

        let chunker = TextChunker::new(&self.config.chunking)?;
        let mut chunks = Vec::new();
        for document in &outcome.documents {
            chunks.extend(chunker.chunk(document));
        }

        let index = Arc::new(
            VectorIndex::build(chunks, self.embedder.as_ref(), &self.config.chunking).await?,
        );
        store::save(&index, index_dir)?;
        self.handle.replace(index.clone());

        info!(
            documents = outcome.documents.len(),
            skipped = outcome.skipped.len(),
            chunks = index.len(),
            "index ready"
        );
        Ok(index)
    }

    /// Answer a question against the active index.
    ///
    /// Requires a prior [`build_or_load_index`](Self::build_or_load_index).
    /// Provider failures while answering resolve to a refusal; anything
    /// that points at broken setup is returned as an error.
    pub async fn answer(&self, question: &str, options: QueryOptions) -> Result<Answer> {
        let (answer, _confidence) = self.answer_with_confidence(question, &options).await?;
        Ok(answer)
    }

    /// Answer and render as a schema-validated structured response
    pub async fn answer_structured(
        &self,
        question: &str,
        options: QueryOptions,
    ) -> Result<StructuredResponse> {
        let (answer, confidence) = self.answer_with_confidence(question, &options).await?;
        schema::to_structured(&answer, confidence)
    }

    /// Run evaluation cases against this pipeline
    pub async fn evaluate(&self, cases: &[EvalCase]) -> EvalReport {
        eval::run(self, cases).await
    }

    async fn answer_with_confidence(
        &self,
        question: &str,
        options: &QueryOptions,
    ) -> Result<(Answer, f32)> {
        let started = Instant::now();
        let result = self.answer_inner(question, options).await;
        if let Ok((answer, confidence)) = &result {
            info!(
                question,
                refused = answer.refused,
                citations = answer.citations.len(),
                confidence = *confidence,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "question answered"
            );
        }
        result
    }

    async fn answer_inner(
        &self,
        question: &str,
        options: &QueryOptions,
    ) -> Result<(Answer, f32)> {
        let index = self
            .handle
            .current()
            .ok_or_else(|| Error::index("no index has been built or loaded"))?;

        let k = options.k.unwrap_or(self.config.retrieval.k);
        let use_mmr = options.use_mmr.unwrap_or(self.config.retrieval.use_mmr);

        let retrieved = match self
            .retriever
            .retrieve(&index, question, k, use_mmr, options.fetch_k)
            .await
        {
            Ok(retrieved) => retrieved,
            Err(err) if err.is_provider() => {
                warn!(error = %err, "query embedding failed, refusing");
                return Ok((Answer::refusal(), FAILURE_CONFIDENCE));
            }
            Err(err) => return Err(err),
        };
        debug!(
            question,
            retrieved = retrieved.len(),
            top_score = retrieved.first().map(|r| r.score).unwrap_or(0.0),
            "retrieval finished"
        );

        let confidence = confidence_from_scores(&retrieved);
        if !self.composer.evidence_is_sufficient(&retrieved) {
            return Ok((Answer::refusal(), confidence.min(REFUSAL_CONFIDENCE_CAP)));
        }

        let context = PromptBuilder::build_context(&retrieved);
        let prompt = PromptBuilder::build_answer_prompt(question, &context);
        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            Err(err) if err.is_provider() => {
                warn!(provider = self.llm.name(), error = %err, "generation failed, refusing");
                return Ok((Answer::refusal(), FAILURE_CONFIDENCE));
            }
            Err(err) => return Err(err),
        };

        let answer = self.composer.finalize(&raw, &retrieved, options.no_citations);
        let confidence = if answer.refused {
            confidence.min(REFUSAL_CONFIDENCE_CAP)
        } else {
            confidence
        };
        Ok((answer, confidence))
    }
}
