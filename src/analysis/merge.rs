use std::sync::Arc;
use tracing::{info, warn};

use super::models::CombinedSummary;
use super::prompts::{MERGE_SYSTEM_PROMPT, build_pair_prompt};
use crate::core::error::{IdeaGraphError, Result};
use crate::core::models::{ConceptInput, ConceptMatch};
use crate::llm::providers::base::LlmProvider;

/// Synthesizes one description from two. The prompt requires every
/// stated fact from both inputs to survive and forbids inventing new
/// ones; divergences land in `notes`.
pub struct MergeSynthesizer {
    llm: Arc<dyn LlmProvider>,
}

impl MergeSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Unlike classification, a merge has no safe fallback output —
    /// fabricating a merged description would violate the no-invention
    /// requirement, so failures propagate.
    pub async fn merge(&self, new: &ConceptInput, existing: &ConceptMatch) -> Result<CombinedSummary> {
        let prompt = build_pair_prompt(new, existing);

        let (response, _metadata) = self
            .llm
            .generate(MERGE_SYSTEM_PROMPT, &prompt, Some("json_object"))
            .await?;

        let summary: CombinedSummary = serde_json::from_str(&response).map_err(|e| {
            warn!(
                "Unparseable merge response: {} (was: {})",
                e,
                crate::safe_truncate_ellipsis(&response, 120)
            );
            IdeaGraphError::LlmProvider(format!("merge response did not match schema: {e}"))
        })?;

        if summary.name.trim().is_empty() || summary.description.trim().is_empty() {
            return Err(IdeaGraphError::Validation(
                "merge produced an empty name or description".to_string(),
            ));
        }

        info!("Merged {} + {} -> {}", new.name, existing.name, summary.name);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedLlm, match_named};

    #[tokio::test]
    async fn test_merge_parses_summary() {
        let synthesizer = MergeSynthesizer::new(Arc::new(ScriptedLlm::new(vec![Ok(
            r#"{"name":"Combined app","description":"notes app with graph and handwriting","notes":"existing idea did not mention handwriting"}"#,
        )])));
        let summary = synthesizer
            .merge(&ConceptInput::new("A", "alpha"), &match_named("B", 1, 0.9))
            .await
            .unwrap();
        assert_eq!(summary.name, "Combined app");
        assert!(summary.notes.is_some());
    }

    #[tokio::test]
    async fn test_merge_rejects_empty_description() {
        let synthesizer = MergeSynthesizer::new(Arc::new(ScriptedLlm::new(vec![Ok(
            r#"{"name":"X","description":"  "}"#,
        )])));
        let err = synthesizer
            .merge(&ConceptInput::new("A", "alpha"), &match_named("B", 1, 0.9))
            .await
            .unwrap_err();
        assert!(matches!(err, IdeaGraphError::Validation(_)));
    }

    #[tokio::test]
    async fn test_merge_propagates_parse_failure() {
        let synthesizer =
            MergeSynthesizer::new(Arc::new(ScriptedLlm::new(vec![Ok("not json")])));
        let err = synthesizer
            .merge(&ConceptInput::new("A", "alpha"), &match_named("B", 1, 0.9))
            .await
            .unwrap_err();
        assert!(matches!(err, IdeaGraphError::LlmProvider(_)));
    }
}
