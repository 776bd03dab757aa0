use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    /// Transport-level failure reported by a wrapper or gateway that
    /// never reached the provider.
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LlmProviderError {
    /// Whether the failure looks like an unreachable/timed-out
    /// provider rather than a bad response.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Unreachable(_) => true,
            _ => false,
        }
    }
}

/// Provenance attached to every completion, so degraded answers can be
/// traced back to the provider that produced them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmMetadata {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_prompt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_completion: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_total: Option<u32>,
    #[serde(default)]
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

/// The classification/merge oracle boundary. Oracle output is untrusted
/// free text: callers must deserialize into typed schemas and treat
/// parse failure as a recoverable condition.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// `response_format` of `"json_object"` asks the provider for
    /// structured output where supported.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_format: Option<&str>,
    ) -> Result<(String, LlmMetadata), LlmProviderError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}
