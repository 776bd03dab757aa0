//! ideagraph — a bitemporal knowledge graph of evolving concepts.
//!
//! Incoming ideas are embedded, matched against existing concepts,
//! reranked, classified into an evolutionary relationship and committed
//! as immutable bitemporal versions linked by EVOLVED_FROM edges.

pub mod analysis;
pub mod core;
pub mod db;
pub mod llm;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::core::config::IdeaGraphConfig;
pub use crate::core::error::{IdeaGraphError, Result};
pub use crate::core::models::{ConceptInput, ConceptMatch, ConceptVersion, EvolutionEdge};
pub use crate::db::{HelixClient, HelixClientError};
pub use crate::llm::embeddings::EmbeddingGenerator;
pub use crate::service::ConceptService;
pub use crate::utils::{safe_truncate, safe_truncate_ellipsis};

/// Install the global tracing subscriber, filtered by `RUST_LOG`
/// (default `ideagraph=info`). Call once from the embedding binary.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ideagraph=info")),
        )
        .with_target(false)
        .init();
}

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-2024-08-06";

pub const DEFAULT_HELIX_PORT: u16 = 6969;

pub const DEFAULT_CACHE_SIZE: usize = 1000;

pub const DEFAULT_CACHE_TTL: u64 = 300;
