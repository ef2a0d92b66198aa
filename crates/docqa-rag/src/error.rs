//! Error types for the document QA pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Document QA errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value or combination
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document could not be read or parsed during ingestion
    #[error("Failed to ingest '{path}': {message}")]
    Ingestion { path: String, message: String },

    /// Document contained no indexable text
    #[error("Document has no content: {0}")]
    EmptyDocument(String),

    /// Persisted index was built under a different configuration
    #[error("Index configuration mismatch: expected {expected}, found {found}")]
    ConfigMismatch { expected: String, found: String },

    /// Embedding or generation capability failure
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// Structured output violated the response contract
    #[error("Schema invariant violated: {0}")]
    SchemaInvariant(String),

    /// Index state error
    #[error("Index error: {0}")]
    Index(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an ingestion error
    pub fn ingestion(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a schema invariant error
    pub fn schema_invariant(message: impl Into<String>) -> Self {
        Self::SchemaInvariant(message.into())
    }

    /// True for embedding/generation capability failures, which resolve
    /// to a refusal at the query boundary instead of propagating
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}
