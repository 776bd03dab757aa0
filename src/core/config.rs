use serde::{Deserialize, Serialize};

/// Process-wide configuration, injected into every component at
/// construction time. There is no module-level singleton: the owner
/// builds a config once at startup and passes handles down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaGraphConfig {
    // Graph store
    pub store_host: String,
    pub store_port: u16,
    pub store_timeout: u64,
    pub store_max_retries: u32,

    // Classification / merge oracle
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f64,
    pub llm_timeout: u64,

    pub llm_fallback_enabled: bool,
    pub llm_fallback_url: String,
    pub llm_fallback_model: String,

    // Embedding gateway
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    /// Fixed index dimensionality; vectors of any other length are
    /// rejected before they reach the similarity index.
    pub embedding_dim: Option<usize>,

    pub embedding_fallback_enabled: bool,
    pub embedding_fallback_url: String,
    pub embedding_fallback_model: String,

    // Ingestion pipeline
    /// Nearest-neighbour candidates fetched from the similarity index.
    pub retrieval_k: usize,
    /// Final cut applied after the last reranker stage.
    pub rerank_top_k: usize,
    /// Best-ranked candidates handed to the evolution classifier.
    pub classifier_max_candidates: usize,
}

impl IdeaGraphConfig {
    pub fn new(store_host: &str, store_port: u16) -> Self {
        Self {
            store_host: store_host.to_string(),
            store_port,
            store_timeout: 30,
            store_max_retries: 3,

            llm_provider: "openai".to_string(),
            llm_model: crate::DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            llm_base_url: None,
            llm_temperature: 0.2,
            llm_timeout: 60,

            llm_fallback_enabled: true,
            llm_fallback_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            llm_fallback_model: "llama3.2".to_string(),

            embedding_provider: "openai".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: "https://api.openai.com/v1".to_string(),
            embedding_api_key: None,
            embedding_dim: Some(1536),

            embedding_fallback_enabled: true,
            embedding_fallback_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_fallback_model: "nomic-embed-text".to_string(),

            retrieval_k: 10,
            rerank_top_k: 3,
            classifier_max_candidates: 5,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.store_host, self.store_port)
    }

    pub fn from_env() -> Self {
        let mut config = Self::new(
            &std::env::var("IDEAGRAPH_STORE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            std::env::var("IDEAGRAPH_STORE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(crate::DEFAULT_HELIX_PORT),
        );

        if let Ok(provider) = std::env::var("IDEAGRAPH_LLM_PROVIDER") {
            config.llm_provider = provider;
        }
        if let Ok(model) = std::env::var("IDEAGRAPH_LLM_MODEL") {
            config.llm_model = model;
        }
        if let Ok(key) = std::env::var("IDEAGRAPH_LLM_API_KEY") {
            config.llm_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("IDEAGRAPH_LLM_BASE_URL") {
            config.llm_base_url = Some(url);
        }
        if let Ok(provider) = std::env::var("IDEAGRAPH_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("IDEAGRAPH_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(url) = std::env::var("IDEAGRAPH_EMBEDDING_URL") {
            config.embedding_url = url;
        }
        if let Ok(key) = std::env::var("IDEAGRAPH_EMBEDDING_API_KEY") {
            config.embedding_api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("IDEAGRAPH_EMBEDDING_DIM") {
            config.embedding_dim = dim.parse().ok();
        }
        if let Ok(k) = std::env::var("IDEAGRAPH_RETRIEVAL_K") {
            if let Ok(k) = k.parse() {
                config.retrieval_k = k;
            }
        }
        if let Ok(k) = std::env::var("IDEAGRAPH_RERANK_TOP_K") {
            if let Ok(k) = k.parse() {
                config.rerank_top_k = k;
            }
        }

        config
    }
}

impl Default for IdeaGraphConfig {
    fn default() -> Self {
        Self::new("localhost", crate::DEFAULT_HELIX_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IdeaGraphConfig::default();
        assert_eq!(config.store_port, crate::DEFAULT_HELIX_PORT);
        assert_eq!(config.retrieval_k, 10);
        assert_eq!(config.rerank_top_k, 3);
        assert_eq!(config.embedding_dim, Some(1536));
    }

    #[test]
    fn test_base_url() {
        let config = IdeaGraphConfig::new("db.internal", 7777);
        assert_eq!(config.base_url(), "http://db.internal:7777");
    }
}
