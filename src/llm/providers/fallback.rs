use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{info, warn};

use super::base::{LlmMetadata, LlmProvider, LlmProviderError};
use super::ollama::OllamaProvider;

const DEFAULT_FALLBACK_URL: &str = "http://localhost:11434";
const DEFAULT_FALLBACK_MODEL: &str = "llama3.2";
const FALLBACK_TIMEOUT_SECS: u64 = 600;

/// Wraps a primary oracle with a local Ollama fallback so a down or
/// timed-out provider degrades instead of failing the request.
#[derive(Debug)]
pub struct LlmProviderWithFallback {
    primary: Arc<dyn LlmProvider>,
    fallback_enabled: bool,
    fallback: OllamaProvider,
    using_fallback: AtomicBool,
    fallback_count: AtomicUsize,
    primary_failures: AtomicUsize,
}

impl LlmProviderWithFallback {
    pub fn new(
        primary: Arc<dyn LlmProvider>,
        fallback_enabled: bool,
        fallback_url: Option<String>,
        fallback_model: Option<String>,
        temperature: f64,
    ) -> Self {
        let fallback_url = fallback_url.unwrap_or_else(|| DEFAULT_FALLBACK_URL.to_string());
        let fallback_model = fallback_model.unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string());

        info!(
            "LlmProviderWithFallback initialized: primary={}, fallback={}/{}",
            primary.provider_name(),
            fallback_url,
            fallback_model
        );

        Self {
            primary,
            fallback_enabled,
            fallback: OllamaProvider::new(
                fallback_url,
                fallback_model,
                temperature,
                FALLBACK_TIMEOUT_SECS,
            ),
            using_fallback: AtomicBool::new(false),
            fallback_count: AtomicUsize::new(0),
            primary_failures: AtomicUsize::new(0),
        }
    }

    async fn fallback_generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_format: Option<&str>,
        original_error: &LlmProviderError,
    ) -> Result<(String, LlmMetadata), LlmProviderError> {
        warn!(
            "Falling back to {} due to: {}",
            self.fallback.model_name(),
            original_error
        );

        let (content, mut metadata) = self
            .fallback
            .generate(system_prompt, user_prompt, response_format)
            .await?;

        metadata.fallback_used = true;
        metadata.original_provider = Some(self.primary.provider_name().to_string());
        metadata.original_error = Some(original_error.to_string());

        self.using_fallback.store(true, Ordering::SeqCst);
        self.fallback_count.fetch_add(1, Ordering::SeqCst);

        info!(
            "Fallback successful, total_fallbacks={}",
            self.fallback_count.load(Ordering::SeqCst)
        );

        Ok((content, metadata))
    }

    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback.load(Ordering::SeqCst)
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::SeqCst)
    }

    pub fn primary_failures(&self) -> usize {
        self.primary_failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for LlmProviderWithFallback {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_format: Option<&str>,
    ) -> Result<(String, LlmMetadata), LlmProviderError> {
        match self
            .primary
            .generate(system_prompt, user_prompt, response_format)
            .await
        {
            Ok((content, metadata)) => {
                self.using_fallback.store(false, Ordering::SeqCst);
                self.primary_failures.store(0, Ordering::SeqCst);
                Ok((content, metadata))
            }
            Err(e) => {
                self.primary_failures.fetch_add(1, Ordering::SeqCst);
                warn!(
                    "Primary LLM provider failed ({}x): {}",
                    self.primary_failures.load(Ordering::SeqCst),
                    e
                );

                if self.fallback_enabled {
                    self.fallback_generate(system_prompt, user_prompt, response_format, &e)
                        .await
                } else {
                    Err(e)
                }
            }
        }
    }

    fn provider_name(&self) -> &str {
        if self.using_fallback.load(Ordering::SeqCst) {
            "ollama (fallback)"
        } else {
            self.primary.provider_name()
        }
    }

    fn model_name(&self) -> &str {
        if self.using_fallback.load(Ordering::SeqCst) {
            self.fallback.model_name()
        } else {
            self.primary.model_name()
        }
    }
}
