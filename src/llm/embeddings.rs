use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_FALLBACK_URL: &str = "http://localhost:11434";
const DEFAULT_FALLBACK_MODEL: &str = "nomic-embed-text";

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),

    #[error("Both primary and fallback failed: primary={0}, fallback={1}")]
    BothFailed(String, String),
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiEmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

struct CacheEntry {
    embedding: Vec<f32>,
    created_at: Instant,
}

/// TTL'd text → vector cache. Equal text yields equal vectors for the
/// lifetime of an entry, which keeps retrieval stable across the
/// retries a single ingestion may perform.
struct EmbeddingCache {
    cache: RwLock<HashMap<String, CacheEntry>>,
    max_size: usize,
    ttl: Duration,
}

impl EmbeddingCache {
    fn new(max_size: usize, ttl_secs: u64) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_size,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    fn get(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.read();
        if let Some(entry) = cache.get(text) {
            if entry.created_at.elapsed() < self.ttl {
                return Some(entry.embedding.clone());
            }
        }
        None
    }

    fn set(&self, text: &str, embedding: Vec<f32>) {
        let mut cache = self.cache.write();
        if cache.len() >= self.max_size {
            // evict the oldest entry
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.created_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }
        cache.insert(
            text.to_string(),
            CacheEntry {
                embedding,
                created_at: Instant::now(),
            },
        );
    }

    fn len(&self) -> usize {
        self.cache.read().len()
    }
}

/// Gateway to the external embedding function. A concept cannot be
/// placed in the graph without its vector, so callers fail the whole
/// ingestion when this errors (after the Ollama fallback is exhausted).
pub struct EmbeddingGenerator {
    provider: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    /// Fixed index dimensionality; `None` disables the check.
    expected_dim: Option<usize>,
    client: Client,
    cache: EmbeddingCache,

    fallback_enabled: bool,
    fallback_url: String,
    fallback_model: String,
    using_fallback: AtomicBool,
    fallback_count: AtomicUsize,
}

impl EmbeddingGenerator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        expected_dim: Option<usize>,
        timeout_secs: u64,
        cache_size: usize,
        cache_ttl: u64,
        fallback_enabled: bool,
        fallback_url: Option<String>,
        fallback_model: Option<String>,
    ) -> Self {
        let provider = provider.into().to_lowercase();
        let model = model.into();
        let base_url = base_url.into();
        let fallback_url = fallback_url.unwrap_or_else(|| DEFAULT_FALLBACK_URL.to_string());
        let fallback_model = fallback_model.unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string());

        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, dim={:?}",
            provider, model, expected_dim
        );

        Self {
            provider,
            base_url,
            model,
            api_key,
            expected_dim,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            cache: EmbeddingCache::new(cache_size, cache_ttl),
            fallback_enabled,
            fallback_url,
            fallback_model,
            using_fallback: AtomicBool::new(false),
            fallback_count: AtomicUsize::new(0),
        }
    }

    pub async fn generate(&self, text: &str, use_cache: bool) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        if use_cache {
            if let Some(cached) = self.cache.get(text) {
                debug!("Cache HIT for: {}...", crate::safe_truncate(text, 50));
                return Ok(cached);
            }
        }

        let result = match self.provider.as_str() {
            "openai" => self.generate_openai(text).await,
            "ollama" => self.generate_ollama(text).await,
            other => Err(EmbeddingError::NotImplemented(other.to_string())),
        };

        let result = match result {
            Ok(embedding) => Ok(embedding),
            Err(e) => {
                debug!("Primary embedding provider unavailable: {}", e);
                if self.fallback_enabled && self.provider != "ollama" {
                    self.fallback_to_ollama(text, &e).await
                } else {
                    Err(e)
                }
            }
        }?;

        self.check_dimension(&result)?;

        if use_cache {
            self.cache.set(text, result.clone());
        }
        Ok(result)
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), EmbeddingError> {
        if let Some(expected) = self.expected_dim {
            if embedding.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        Ok(())
    }

    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let api_url = self.base_url.trim_end_matches('/');

        let request = OpenAiEmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", api_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OpenAiEmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        Ok(response.embedding)
    }

    async fn fallback_to_ollama(
        &self,
        text: &str,
        original_error: &EmbeddingError,
    ) -> Result<Vec<f32>, EmbeddingError> {
        info!(
            "Using fallback Ollama ({}/{}) - primary unavailable",
            self.fallback_url, self.fallback_model
        );

        let request = OllamaEmbeddingRequest {
            model: self.fallback_model.clone(),
            prompt: text.to_string(),
        };

        let both = |e: String| EmbeddingError::BothFailed(original_error.to_string(), e);

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.fallback_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| both(e.to_string()))?
            .error_for_status()
            .map_err(|e| both(e.to_string()))?
            .json::<OllamaEmbeddingResponse>()
            .await
            .map_err(|e| both(e.to_string()))?;

        self.using_fallback.store(true, Ordering::SeqCst);
        self.fallback_count.fetch_add(1, Ordering::SeqCst);

        info!(
            "Fallback embedding successful, dims={}, total_fallbacks={}",
            response.embedding.len(),
            self.fallback_count.load(Ordering::SeqCst)
        );

        Ok(response.embedding)
    }

    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback.load(Ordering::SeqCst)
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::SeqCst)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
