pub mod helix;
pub mod memory;

pub use helix::HelixGraphStore;
pub use memory::MemoryGraphStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::models::{EvolutionType, ParentVersion};
use crate::core::models::{ConceptMatch, ConceptVersion, EvolutionEdge};

#[derive(Error, Debug)]
pub enum StoreError {
    /// Store cannot be reached. Recoverable: retrieval degrades to an
    /// empty candidate list, commit reports unavailability.
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// A read query failed for a non-connectivity reason.
    #[error("Query failed: {0}")]
    Query(String),

    /// The store rejected a write mid-operation. Fatal: nothing may be
    /// half-written, the caller propagates this.
    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything needed to create one new ConceptVersion row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDraft {
    pub name: String,
    pub description: String,
    pub embedding: Option<Vec<f32>>,
    pub valid_from: DateTime<Utc>,
    pub transaction_from: DateTime<Utc>,
    pub context: Option<String>,
}

/// One EVOLVED_FROM edge to create alongside the new version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentLink {
    pub parent: ParentVersion,
    pub evolution_type: EvolutionType,
    pub confidence: f64,
    pub explanation: String,
}

/// What an atomic commit produced.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub version: ConceptVersion,
    /// Parent references that named no existing version; skipped, not
    /// fatal.
    pub skipped_parents: Vec<ParentVersion>,
}

/// Abstract transactional property-graph store with a vector index.
///
/// `commit_version` is the single mutation path and must be atomic:
/// it upserts the Concept, allocates the next version number under
/// per-name serialization, writes the immutable row, closes the
/// previously current row (`transaction_to`), advances
/// `current_version` and creates the parent edges — all or nothing.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// k-nearest current versions by vector distance, descending
    /// engine-native score. Historical rows are never candidates.
    async fn similar_concepts(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ConceptMatch>, StoreError>;

    async fn commit_version(
        &self,
        draft: &VersionDraft,
        parents: &[ParentLink],
    ) -> Result<CommitReceipt, StoreError>;

    /// All versions for a name, ascending by version number.
    async fn version_history(&self, name: &str) -> Result<Vec<ConceptVersion>, StoreError>;

    /// The version whose bitemporal intervals both cover `at`, if any.
    async fn version_as_of(
        &self,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConceptVersion>, StoreError>;

    /// EVOLVED_FROM edges out of one child version.
    async fn parent_edges(
        &self,
        name: &str,
        version: i64,
    ) -> Result<Vec<EvolutionEdge>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
