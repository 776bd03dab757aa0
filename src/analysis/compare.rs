use std::sync::Arc;
use tracing::{info, warn};

use super::models::{CompareDecision, CompareResult};
use super::prompts::{COMPARE_SYSTEM_PROMPT, build_pair_prompt};
use crate::core::error::{IdeaGraphError, Result};
use crate::core::models::{ConceptInput, ConceptMatch};
use crate::llm::providers::base::LlmProvider;

/// Simpler three-way pairwise comparison, exposed as a direct
/// operation. The canonical ingestion path uses the evolution
/// classifier instead; this answers "how do these two relate" on
/// demand.
pub struct ConceptComparator {
    llm: Arc<dyn LlmProvider>,
}

impl ConceptComparator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Oracle failure or an unparseable verdict degrades to `new`:
    /// treating an idea as novel is the safe default, it only ever
    /// adds a version instead of touching an existing concept.
    pub async fn compare(&self, new: &ConceptInput, existing: &ConceptMatch) -> Result<CompareResult> {
        let prompt = build_pair_prompt(new, existing);

        let response = match self
            .llm
            .generate(COMPARE_SYSTEM_PROMPT, &prompt, Some("json_object"))
            .await
        {
            Ok((content, _metadata)) => content,
            Err(e) if e.is_connectivity() => {
                warn!("Compare oracle unreachable, defaulting to new: {}", e);
                return Ok(CompareResult { status: CompareDecision::New });
            }
            Err(e) => return Err(IdeaGraphError::from(e)),
        };

        match serde_json::from_str::<CompareResult>(&response) {
            Ok(result) => {
                info!(
                    "Compared {} vs {}: {:?}",
                    new.name, existing.name, result.status
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    "Unparseable compare verdict ({}), defaulting to new: {}",
                    e,
                    crate::safe_truncate_ellipsis(&response, 120)
                );
                Ok(CompareResult { status: CompareDecision::New })
            }
        }
    }
}
