use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::models::EvolutionResult;
use crate::core::error::Result;
use crate::core::models::{ConceptInput, ConceptVersion};
use crate::store::{GraphStore, ParentLink, StoreError, VersionDraft};

/// Outcome of a commit attempt.
#[derive(Debug, Clone)]
pub enum CommitStatus {
    Committed(ConceptVersion),
    /// Store could not be reached: the caller may report a degraded
    /// response instead of failing the request. Distinct from a
    /// rejected write, which is fatal and propagates as an error.
    StoreUnavailable,
}

impl CommitStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn version(&self) -> Option<&ConceptVersion> {
        match self {
            Self::Committed(v) => Some(v),
            Self::StoreUnavailable => None,
        }
    }
}

/// The integration point where upstream decisions become durable
/// state. All mutation in the system goes through here.
pub struct VersionCommitter {
    store: Arc<dyn GraphStore>,
}

impl VersionCommitter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Commit the new concept as the next version of its name, linked
    /// to the classified parents. The store performs the whole
    /// sequence atomically; dangling parents it skipped are logged
    /// here, not failed.
    pub async fn commit(&self, new: &ConceptInput, evolution: &EvolutionResult) -> Result<CommitStatus> {
        let now = Utc::now();

        let draft = VersionDraft {
            name: new.name.clone(),
            description: new.description.clone(),
            embedding: new.embedding.clone(),
            valid_from: new.valid_from.unwrap_or(now),
            transaction_from: now,
            context: new.context.clone(),
        };

        let parents: Vec<ParentLink> = evolution
            .parent_versions
            .iter()
            .map(|parent| ParentLink {
                parent: parent.clone(),
                evolution_type: evolution.evolution_type,
                confidence: evolution.confidence,
                explanation: evolution.explanation.clone(),
            })
            .collect();

        match self.store.commit_version(&draft, &parents).await {
            Ok(receipt) => {
                if !receipt.skipped_parents.is_empty() {
                    warn!(
                        "Store skipped {} dangling parent reference(s) for {}",
                        receipt.skipped_parents.len(),
                        new.name
                    );
                }
                info!(
                    "Committed {} v{} ({:?}, {} parents)",
                    receipt.version.name,
                    receipt.version.version,
                    evolution.evolution_type,
                    parents.len() - receipt.skipped_parents.len()
                );
                Ok(CommitStatus::Committed(receipt.version))
            }
            Err(StoreError::Unreachable(msg)) => {
                warn!("Store unreachable, commit not attempted: {}", msg);
                Ok(CommitStatus::StoreUnavailable)
            }
            Err(e) => Err(e.into()),
        }
    }
}
