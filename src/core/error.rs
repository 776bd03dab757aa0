use thiserror::Error;

use crate::llm::embeddings::EmbeddingError;
use crate::llm::providers::base::LlmProviderError;
use crate::store::StoreError;

/// Crate-level error. Component modules keep their own focused error
/// enums and convert at the service boundary.
#[derive(Error, Debug)]
pub enum IdeaGraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Concept not found: {0}")]
    ConceptNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store rejected write: {0}")]
    StoreRejected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EmbeddingError> for IdeaGraphError {
    fn from(e: EmbeddingError) -> Self {
        Self::Embedding(e.to_string())
    }
}

impl From<LlmProviderError> for IdeaGraphError {
    fn from(e: LlmProviderError) -> Self {
        Self::LlmProvider(e.to_string())
    }
}

impl From<StoreError> for IdeaGraphError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unreachable(msg) => Self::Connection(msg),
            StoreError::Rejected(msg) => Self::StoreRejected(msg),
            StoreError::Query(msg) => Self::Query(msg),
            StoreError::Serialization(err) => Self::Serialization(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdeaGraphError>;
