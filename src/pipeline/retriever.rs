use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::error::{IdeaGraphError, Result};
use crate::core::models::ConceptMatch;
use crate::store::{GraphStore, StoreError};

/// Read-only candidate retrieval against the similarity index.
///
/// An unreachable store degrades to "no matches found": downstream
/// treats the empty list as a valid treat-as-new signal, never as an
/// error state.
pub struct CandidateRetriever {
    store: Arc<dyn GraphStore>,
    k: usize,
    expected_dim: Option<usize>,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn GraphStore>, k: usize, expected_dim: Option<usize>) -> Result<Self> {
        if k == 0 {
            return Err(IdeaGraphError::Config(
                "retrieval k must be greater than zero".to_string(),
            ));
        }
        Ok(Self { store, k, expected_dim })
    }

    pub async fn retrieve(&self, embedding: &[f32]) -> Result<Vec<ConceptMatch>> {
        if let Some(expected) = self.expected_dim {
            if embedding.len() != expected {
                return Err(IdeaGraphError::Validation(format!(
                    "query embedding has {} dimensions, index expects {}",
                    embedding.len(),
                    expected
                )));
            }
        }

        match self.store.similar_concepts(embedding, self.k).await {
            Ok(matches) => {
                debug!("Retrieved {} candidates (k={})", matches.len(), self.k);
                Ok(matches)
            }
            Err(StoreError::Unreachable(msg)) => {
                warn!("Store unreachable during retrieval, degrading to no matches: {}", msg);
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("Retrieval query failed, degrading to no matches: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use crate::core::models::{ConceptVersion, EvolutionEdge};
    use crate::store::{CommitReceipt, ParentLink, VersionDraft};
    use crate::test_support::match_named;

    struct FailingStore(fn() -> StoreError);

    #[async_trait]
    impl GraphStore for FailingStore {
        async fn similar_concepts(
            &self,
            _embedding: &[f32],
            _k: usize,
        ) -> std::result::Result<Vec<ConceptMatch>, StoreError> {
            Err((self.0)())
        }

        async fn commit_version(
            &self,
            _draft: &VersionDraft,
            _parents: &[ParentLink],
        ) -> std::result::Result<CommitReceipt, StoreError> {
            Err((self.0)())
        }

        async fn version_history(
            &self,
            _name: &str,
        ) -> std::result::Result<Vec<ConceptVersion>, StoreError> {
            Ok(Vec::new())
        }

        async fn version_as_of(
            &self,
            _name: &str,
            _at: DateTime<Utc>,
        ) -> std::result::Result<Option<ConceptVersion>, StoreError> {
            Ok(None)
        }

        async fn parent_edges(
            &self,
            _name: &str,
            _version: i64,
        ) -> std::result::Result<Vec<EvolutionEdge>, StoreError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> std::result::Result<(), StoreError> {
            Err((self.0)())
        }
    }

    struct FixedStore(Vec<ConceptMatch>);

    #[async_trait]
    impl GraphStore for FixedStore {
        async fn similar_concepts(
            &self,
            _embedding: &[f32],
            k: usize,
        ) -> std::result::Result<Vec<ConceptMatch>, StoreError> {
            Ok(self.0.iter().take(k).cloned().collect())
        }

        async fn commit_version(
            &self,
            _draft: &VersionDraft,
            _parents: &[ParentLink],
        ) -> std::result::Result<CommitReceipt, StoreError> {
            Err(StoreError::Rejected("read-only".to_string()))
        }

        async fn version_history(
            &self,
            _name: &str,
        ) -> std::result::Result<Vec<ConceptVersion>, StoreError> {
            Ok(Vec::new())
        }

        async fn version_as_of(
            &self,
            _name: &str,
            _at: DateTime<Utc>,
        ) -> std::result::Result<Option<ConceptVersion>, StoreError> {
            Ok(None)
        }

        async fn parent_edges(
            &self,
            _name: &str,
            _version: i64,
        ) -> std::result::Result<Vec<EvolutionEdge>, StoreError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_zero_k_rejected() {
        let store = Arc::new(FixedStore(Vec::new()));
        assert!(CandidateRetriever::new(store, 0, None).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_empty() {
        let store = Arc::new(FailingStore(|| {
            StoreError::Unreachable("connection refused".to_string())
        }));
        let retriever = CandidateRetriever::new(store, 5, None).unwrap();
        let matches = retriever.retrieve(&[0.1, 0.2]).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_degrades_to_empty() {
        let store = Arc::new(FailingStore(|| {
            StoreError::Query("malformed vector literal".to_string())
        }));
        let retriever = CandidateRetriever::new(store, 5, None).unwrap();
        let matches = retriever.retrieve(&[0.1, 0.2]).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let store = Arc::new(FixedStore(Vec::new()));
        let retriever = CandidateRetriever::new(store, 5, Some(3)).unwrap();
        let err = retriever.retrieve(&[0.1, 0.2]).await.unwrap_err();
        assert!(matches!(err, IdeaGraphError::Validation(_)));
    }

    #[tokio::test]
    async fn test_retrieval_caps_at_k() {
        let store = Arc::new(FixedStore(vec![
            match_named("a", 1, 0.9),
            match_named("b", 1, 0.8),
            match_named("c", 1, 0.7),
        ]));
        let retriever = CandidateRetriever::new(store, 2, None).unwrap();
        let matches = retriever.retrieve(&[0.1]).await.unwrap();
        assert_eq!(matches.len(), 2);
    }
}
