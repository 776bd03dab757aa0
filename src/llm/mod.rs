pub mod embeddings;
pub mod factory;
pub mod providers;

pub use embeddings::{EmbeddingError, EmbeddingGenerator};
pub use factory::{EmbeddingProviderFactory, LlmProviderFactory};
pub use providers::base::{LlmMetadata, LlmProvider, LlmProviderError};
