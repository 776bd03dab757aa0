use std::sync::Arc;

use super::embeddings::EmbeddingGenerator;
use super::providers::base::LlmProvider;
use super::providers::fallback::LlmProviderWithFallback;
use super::providers::ollama::OllamaProvider;
use super::providers::openai::OpenAiProvider;
use crate::core::config::IdeaGraphConfig;
use crate::core::error::{IdeaGraphError, Result};
use crate::{DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL};

pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(config: &IdeaGraphConfig) -> Result<Arc<dyn LlmProvider>> {
        let provider: Arc<dyn LlmProvider> = match config.llm_provider.as_str() {
            "openai" => Arc::new(OpenAiProvider::new(
                config.llm_api_key.clone().unwrap_or_default(),
                config.llm_base_url.clone(),
                config.llm_model.clone(),
                config.llm_temperature,
                config.llm_timeout,
            )),
            "ollama" => Arc::new(OllamaProvider::new(
                config
                    .llm_base_url
                    .clone()
                    .unwrap_or_else(|| crate::DEFAULT_OLLAMA_URL.to_string()),
                config.llm_model.clone(),
                config.llm_temperature,
                config.llm_timeout,
            )),
            other => {
                return Err(IdeaGraphError::Config(format!(
                    "Unknown LLM provider: {other}. Supported: openai, ollama"
                )));
            }
        };
        Ok(provider)
    }

    /// Primary oracle wrapped with the Ollama fallback from config.
    pub fn create_with_fallback(config: &IdeaGraphConfig) -> Result<Arc<dyn LlmProvider>> {
        let primary = Self::create(config)?;
        if !config.llm_fallback_enabled {
            return Ok(primary);
        }
        Ok(Arc::new(LlmProviderWithFallback::new(
            primary,
            true,
            Some(config.llm_fallback_url.clone()),
            Some(config.llm_fallback_model.clone()),
            config.llm_temperature,
        )))
    }
}

pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn from_config(config: &IdeaGraphConfig) -> EmbeddingGenerator {
        EmbeddingGenerator::new(
            config.embedding_provider.clone(),
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            config.embedding_dim,
            config.llm_timeout,
            DEFAULT_CACHE_SIZE,
            DEFAULT_CACHE_TTL,
            config.embedding_fallback_enabled,
            Some(config.embedding_fallback_url.clone()),
            Some(config.embedding_fallback_model.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_provider() {
        let mut config = IdeaGraphConfig::default();
        config.llm_api_key = Some("test-key".to_string());
        let provider = LlmProviderFactory::create(&config).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_create_ollama_provider() {
        let mut config = IdeaGraphConfig::default();
        config.llm_provider = "ollama".to_string();
        config.llm_model = "llama3.1:8b".to_string();
        let provider = LlmProviderFactory::create(&config).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let mut config = IdeaGraphConfig::default();
        config.llm_provider = "mystery".to_string();
        let err = LlmProviderFactory::create(&config).unwrap_err();
        assert!(matches!(err, IdeaGraphError::Config(_)));
    }
}
