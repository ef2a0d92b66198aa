//! Capability traits for external providers
//!
//! Embedding and generation are consumed as black boxes behind these
//! traits. Concrete clients (hosted APIs, local inference servers) live
//! with the application that wires the pipeline together; the pipeline
//! itself never depends on a specific backend.

pub mod embedding;
pub mod llm;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
