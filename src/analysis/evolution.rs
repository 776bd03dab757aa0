use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{EvolutionResult, ParentVersion};
use super::prompts::{EVOLUTION_SYSTEM_PROMPT, build_evolution_prompt};
use crate::core::models::{ConceptInput, ConceptMatch};
use crate::llm::providers::base::LlmProvider;

/// Oracle-backed classifier for the evolutionary relationship between
/// a new concept and its best-ranked candidates.
///
/// Never fails the request: an unreachable oracle or unparseable
/// response degrades to [`EvolutionResult::unavailable`].
pub struct EvolutionAnalyzer {
    llm: Arc<dyn LlmProvider>,
    max_candidates: usize,
}

impl EvolutionAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>, max_candidates: usize) -> Self {
        info!(
            "EvolutionAnalyzer initialized: provider={}, max_candidates={}",
            llm.provider_name(),
            max_candidates
        );
        Self {
            llm,
            max_candidates: max_candidates.max(1),
        }
    }

    pub async fn analyze(&self, new: &ConceptInput, matches: &[ConceptMatch]) -> EvolutionResult {
        if matches.is_empty() {
            debug!("No candidates for {}, classifying as branch", new.name);
            return EvolutionResult {
                explanation: "no prior concepts to evolve from".to_string(),
                ..EvolutionResult::unavailable()
            };
        }

        let window = &matches[..matches.len().min(self.max_candidates)];
        let prompt = build_evolution_prompt(new, window);

        let response = match self
            .llm
            .generate(EVOLUTION_SYSTEM_PROMPT, &prompt, Some("json_object"))
            .await
        {
            Ok((content, _metadata)) => content,
            Err(e) => {
                warn!("Evolution oracle call failed: {}", e);
                return EvolutionResult::unavailable();
            }
        };

        let mut result = match serde_json::from_str::<EvolutionResult>(&response) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Failed to parse evolution response: {} (was: {})",
                    e,
                    crate::safe_truncate_ellipsis(&response, 200)
                );
                return EvolutionResult::unavailable();
            }
        };

        result.confidence = result.confidence.clamp(0.0, 1.0);
        self.validate_parents(&mut result, window);

        info!(
            "Evolution classified: type={:?}, confidence={:.2}, parents={}",
            result.evolution_type,
            result.confidence,
            result.parent_versions.len()
        );

        result
    }

    /// The oracle is untrusted: keep only parent references that were
    /// in the candidate window. Dangling references are dropped and
    /// recorded in the explanation rather than rejecting the verdict.
    fn validate_parents(&self, result: &mut EvolutionResult, window: &[ConceptMatch]) {
        let (kept, dropped): (Vec<ParentVersion>, Vec<ParentVersion>) = result
            .parent_versions
            .drain(..)
            .partition(|p| window.iter().any(|m| m.name == p.name && m.version == p.version));

        if !dropped.is_empty() {
            let names = dropped
                .iter()
                .map(|p| format!("{} v{}", p.name, p.version))
                .collect::<Vec<_>>()
                .join(", ");
            warn!("Dropping dangling parent references: {}", names);
            result.explanation = format!(
                "{} [dropped unknown parent references: {}]",
                result.explanation, names
            );
        }

        result.parent_versions = kept;
    }
}
