use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{EnumString, IntoStaticStr};

/// How a new concept relates to its parents. Closed vocabulary: every
/// consumer matches exhaustively, there is no "other" escape hatch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EvolutionType {
    /// Same idea reshaped, one parent.
    Variation,
    /// Multiple parents merged into one descendant.
    Combination,
    /// A parent made more precise or detailed.
    Refinement,
    /// Genuinely new direction; the no-parents case.
    Branch,
}

impl Default for EvolutionType {
    fn default() -> Self {
        Self::Branch
    }
}

/// Reference to one parent concept version named by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentVersion {
    pub name: String,
    pub version: i64,
}

/// Verdict of the evolution classifier for one ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    #[serde(default)]
    pub parent_versions: Vec<ParentVersion>,
    pub evolution_type: EvolutionType,
    pub confidence: f64,
    pub explanation: String,
}

impl EvolutionResult {
    /// Deterministic fallback when the oracle is unreachable or its
    /// output cannot be parsed.
    pub fn unavailable() -> Self {
        Self {
            parent_versions: Vec::new(),
            evolution_type: EvolutionType::Branch,
            confidence: 0.0,
            explanation: "no evolution analysis available".to_string(),
        }
    }

    pub fn is_branch(&self) -> bool {
        self.evolution_type == EvolutionType::Branch
    }
}

/// Three-way verdict of the simpler pairwise comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompareDecision {
    /// The new idea stands on its own.
    New,
    /// The new idea refines the existing one.
    Extend,
    /// The two ideas say the same thing.
    Equal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResult {
    pub status: CompareDecision,
}

/// Output of the merge synthesizer: one description carrying all
/// information from both inputs, with divergences noted rather than
/// silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One candidate's judged relevance in the LLM rerank stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResult {
    pub relevance: f64,
    pub explanation: String,
}

/// Full rerank response, keyed by candidate name. Candidates missing
/// from the mapping keep their prior-stage score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsResponse {
    pub rankings: HashMap<String, RankingResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_evolution_type_roundtrip() {
        let json = serde_json::to_string(&EvolutionType::Combination).unwrap();
        assert_eq!(json, "\"combination\"");
        let back: EvolutionType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EvolutionType::Combination);
    }

    #[test]
    fn test_evolution_type_from_str() {
        assert_eq!(EvolutionType::from_str("branch").unwrap(), EvolutionType::Branch);
        assert!(EvolutionType::from_str("mutation").is_err());
    }

    #[test]
    fn test_compare_decision_parsing() {
        let r: CompareResult = serde_json::from_str(r#"{"status":"extend"}"#).unwrap();
        assert_eq!(r.status, CompareDecision::Extend);
    }

    #[test]
    fn test_unavailable_fallback_shape() {
        let f = EvolutionResult::unavailable();
        assert!(f.parent_versions.is_empty());
        assert_eq!(f.evolution_type, EvolutionType::Branch);
        assert_eq!(f.confidence, 0.0);
    }

    #[test]
    fn test_evolution_result_missing_parents_defaults_empty() {
        let r: EvolutionResult = serde_json::from_str(
            r#"{"evolution_type":"branch","confidence":0.5,"explanation":"x"}"#,
        )
        .unwrap();
        assert!(r.parent_versions.is_empty());
    }
}
