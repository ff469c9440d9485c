//! Error types for the `concierge-rag` crate.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while answering a question or maintaining the
/// knowledge base.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding collaborator failed or timed out.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The knowledge store failed or timed out.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion model failed or timed out.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The intent classifier returned output that is not a valid intent.
    #[error("Classifier output could not be parsed: {0}")]
    ClassifierParseError(String),

    /// A vector with zero (or non-finite) magnitude cannot be normalized.
    #[error("Cannot normalize a degenerate vector of {dimensions} dimensions")]
    DegenerateVector {
        /// Length of the rejected vector.
        dimensions: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Knowledge base ingestion failed.
    #[error("Ingest error: {0}")]
    IngestError(String),
}

/// A convenience result type for concierge operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Failure taxonomy used in structured logs and at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Embedding,
    Search,
    Completion,
    ClassifierParse,
    DegenerateVector,
    Validation,
    Internal,
}

impl FailureKind {
    /// The upper-case code for this failure kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Embedding => "EMBEDDING_FAILURE",
            FailureKind::Search => "SEARCH_FAILURE",
            FailureKind::Completion => "COMPLETION_FAILURE",
            FailureKind::ClassifierParse => "CLASSIFIER_PARSE_FAILURE",
            FailureKind::DegenerateVector => "DEGENERATE_VECTOR",
            FailureKind::Validation => "VALIDATION_FAILURE",
            FailureKind::Internal => "INTERNAL_FAILURE",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RagError {
    /// Classify this error into the failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            RagError::EmbeddingError { .. } => FailureKind::Embedding,
            RagError::VectorStoreError { .. } => FailureKind::Search,
            RagError::CompletionError { .. } => FailureKind::Completion,
            RagError::ClassifierParseError(_) => FailureKind::ClassifierParse,
            RagError::DegenerateVector { .. } => FailureKind::DegenerateVector,
            RagError::ConfigError(_) | RagError::IngestError(_) => FailureKind::Internal,
        }
    }
}

/// Await `future`, giving up after `limit`.
///
/// An elapsed deadline is reported through `on_timeout`, which receives a
/// human-readable message and builds the error variant of the guarded call.
pub async fn with_deadline<T, F>(
    limit: Duration,
    future: F,
    on_timeout: impl FnOnce(String) -> RagError,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!("timed out after {}ms", limit.as_millis()))),
    }
}
