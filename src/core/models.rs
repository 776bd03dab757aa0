use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::models::EvolutionType;

/// A loosely-specified incoming idea, before it has been placed in the
/// graph. The embedding is filled in by the pipeline when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptInput {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// When the idea became true in the real world; defaults to commit
    /// time when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ConceptInput {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            embedding: None,
            valid_from: None,
            context: None,
        }
    }
}

/// One immutable bitemporal snapshot of a concept.
///
/// `valid_from`/`valid_to` track real-world validity,
/// `transaction_from`/`transaction_to` track what the graph believed
/// and when. `transaction_to = None` marks the current record; at most
/// one row per name carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptVersion {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub transaction_from: DateTime<Utc>,
    pub transaction_to: Option<DateTime<Utc>>,
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ConceptVersion {
    /// Whether both time axes cover `at`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at
            && self.valid_to.map_or(true, |t| t > at)
            && self.transaction_from <= at
            && self.transaction_to.map_or(true, |t| t > at)
    }

    pub fn is_current(&self) -> bool {
        self.transaction_to.is_none()
    }
}

/// Transient retrieval/rerank record. `score` is the engine-native
/// similarity from the vector index; `similarity` is the rescaled or
/// rejudged relevance written by reranker stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptMatch {
    pub name: String,
    pub description: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub version: i64,
}

impl ConceptMatch {
    /// The most recently assigned relevance, falling back to the
    /// retrieval score when no reranker has touched this match.
    pub fn relevance(&self) -> f64 {
        self.similarity.unwrap_or(self.score)
    }
}

/// Persisted EVOLVED_FROM edge from a child version to one parent
/// version. Created only alongside the child's commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionEdge {
    pub parent_name: String,
    pub parent_version: i64,
    pub evolution_type: EvolutionType,
    pub confidence: f64,
    pub explanation: String,
    pub transaction_from: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn version_at(valid: i64, tx: i64) -> ConceptVersion {
        ConceptVersion {
            name: "a".to_string(),
            description: "d".to_string(),
            embedding: None,
            valid_from: Utc.timestamp_opt(valid, 0).unwrap(),
            valid_to: None,
            transaction_from: Utc.timestamp_opt(tx, 0).unwrap(),
            transaction_to: None,
            version: 1,
            context: None,
        }
    }

    #[test]
    fn test_covers_open_intervals() {
        let v = version_at(100, 100);
        assert!(v.covers(Utc.timestamp_opt(150, 0).unwrap()));
        assert!(!v.covers(Utc.timestamp_opt(50, 0).unwrap()));
    }

    #[test]
    fn test_covers_closed_transaction_interval() {
        let mut v = version_at(100, 100);
        v.transaction_to = Some(Utc.timestamp_opt(200, 0).unwrap());
        assert!(v.covers(Utc.timestamp_opt(150, 0).unwrap()));
        assert!(!v.covers(Utc.timestamp_opt(200, 0).unwrap()));
        assert!(!v.is_current());
    }

    #[test]
    fn test_relevance_prefers_similarity() {
        let m = ConceptMatch {
            name: "a".to_string(),
            description: "d".to_string(),
            score: 0.9,
            embedding: None,
            similarity: Some(0.4),
            valid_from: Utc::now(),
            valid_to: None,
            version: 1,
        };
        assert_eq!(m.relevance(), 0.4);
    }
}
