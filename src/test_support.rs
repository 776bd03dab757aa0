//! Shared test doubles.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::core::models::ConceptMatch;
use crate::llm::providers::base::{LlmMetadata, LlmProvider, LlmProviderError};

/// LLM fake that replays a fixed script of responses, one per call.
#[derive(Debug)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, String>>>,
    offline: bool,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<&str, &str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            offline: false,
        }
    }

    /// A provider that cannot be reached at all: every call fails with
    /// a connectivity-classed error.
    pub fn offline() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            offline: true,
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _response_format: Option<&str>,
    ) -> Result<(String, LlmMetadata), LlmProviderError> {
        if self.offline {
            return Err(LlmProviderError::Unreachable(
                "connection refused".to_string(),
            ));
        }
        match self.responses.lock().pop_front() {
            Some(Ok(content)) => Ok((content, LlmMetadata::default())),
            Some(Err(e)) => Err(LlmProviderError::Provider(e)),
            None => Err(LlmProviderError::Internal("script exhausted".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn match_named(name: &str, version: i64, score: f64) -> ConceptMatch {
    ConceptMatch {
        name: name.to_string(),
        description: format!("{name} description"),
        score,
        embedding: None,
        similarity: None,
        valid_from: Utc::now(),
        valid_to: None,
        version,
    }
}
