//! Evidence-grounded document question answering.
//!
//! Ingests a directory of text documents, splits them into fixed-size
//! overlapping chunks, indexes chunk embeddings for exact cosine
//! retrieval, and answers questions with citations extracted from the
//! model's output. Questions the corpus cannot support are refused
//! with one canonical sentence; a schema validator enforces the
//! refusal contract on every structured response, and a built-in
//! evaluation harness exercises both behaviors.
//!
//! The embedding and generation capabilities are traits, so any
//! provider can be plugged in.

pub mod config;
pub mod error;
pub mod eval;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod schema;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use eval::{default_cases, EvalCase, EvalReport};
pub use pipeline::{QueryOptions, RagPipeline};
pub use providers::{EmbeddingProvider, LlmProvider};
pub use retrieval::{RetrievedChunk, VectorIndex};
pub use types::{
    Answer, Chunk, Citation, Document, DocumentFormat, StructuredResponse, REFUSAL_TEXT,
};
