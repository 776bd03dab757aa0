use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use super::{CommitReceipt, GraphStore, ParentLink, StoreError, VersionDraft};
use crate::analysis::models::ParentVersion;
use crate::core::models::{ConceptMatch, ConceptVersion, EvolutionEdge};
use crate::pipeline::scoring::cosine_similarity;

struct ConceptRecord {
    current_version: i64,
    versions: Vec<ConceptVersion>,
}

struct ChildEdges {
    child_version: i64,
    edges: Vec<EvolutionEdge>,
}

/// In-process [`GraphStore`]. Vector search is a cosine-similarity
/// scan; every commit runs under the write lock, which is the per-name
/// critical section that keeps version numbers gap-free under
/// concurrent ingestion.
#[derive(Default)]
pub struct MemoryGraphStore {
    concepts: RwLock<HashMap<String, ConceptRecord>>,
    edges: RwLock<HashMap<String, Vec<ChildEdges>>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.read().len()
    }

    pub fn current_version_of(&self, name: &str) -> Option<i64> {
        self.concepts.read().get(name).map(|c| c.current_version)
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn similar_concepts(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ConceptMatch>, StoreError> {
        let concepts = self.concepts.read();

        let mut matches: Vec<ConceptMatch> = concepts
            .values()
            .flat_map(|record| record.versions.iter())
            .filter(|v| v.is_current())
            .filter_map(|v| {
                let candidate = v.embedding.as_deref()?;
                Some(ConceptMatch {
                    name: v.name.clone(),
                    description: v.description.clone(),
                    score: cosine_similarity(embedding, candidate),
                    embedding: v.embedding.clone(),
                    similarity: None,
                    valid_from: v.valid_from,
                    valid_to: v.valid_to,
                    version: v.version,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(k);
        Ok(matches)
    }

    async fn commit_version(
        &self,
        draft: &VersionDraft,
        parents: &[ParentLink],
    ) -> Result<CommitReceipt, StoreError> {
        if draft.name.trim().is_empty() {
            return Err(StoreError::Rejected("concept name must not be empty".to_string()));
        }

        let mut concepts = self.concepts.write();
        let mut edges = self.edges.write();

        // Validate parents against committed state before any mutation
        let mut skipped: Vec<ParentVersion> = Vec::new();
        let mut valid: Vec<&ParentLink> = Vec::new();
        for link in parents {
            let exists = concepts
                .get(&link.parent.name)
                .map(|r| r.versions.iter().any(|v| v.version == link.parent.version))
                .unwrap_or(false);
            if exists {
                valid.push(link);
            } else {
                skipped.push(link.parent.clone());
            }
        }

        let record = concepts.entry(draft.name.clone()).or_insert(ConceptRecord {
            current_version: 0,
            versions: Vec::new(),
        });

        let next = record.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;

        // Close out the belief interval of the superseded row
        if let Some(previous) = record.versions.iter_mut().find(|v| v.is_current()) {
            previous.transaction_to = Some(draft.transaction_from);
        }

        let version = ConceptVersion {
            name: draft.name.clone(),
            description: draft.description.clone(),
            embedding: draft.embedding.clone(),
            valid_from: draft.valid_from,
            valid_to: None,
            transaction_from: draft.transaction_from,
            transaction_to: None,
            version: next,
            context: draft.context.clone(),
        };

        record.versions.push(version.clone());
        record.current_version = next;

        if !valid.is_empty() {
            edges.entry(draft.name.clone()).or_default().push(ChildEdges {
                child_version: next,
                edges: valid
                    .iter()
                    .map(|link| EvolutionEdge {
                        parent_name: link.parent.name.clone(),
                        parent_version: link.parent.version,
                        evolution_type: link.evolution_type,
                        confidence: link.confidence,
                        explanation: link.explanation.clone(),
                        transaction_from: draft.transaction_from,
                    })
                    .collect(),
            });
        }

        debug!("Committed {} v{} ({} edges)", draft.name, next, valid.len());

        Ok(CommitReceipt {
            version,
            skipped_parents: skipped,
        })
    }

    async fn version_history(&self, name: &str) -> Result<Vec<ConceptVersion>, StoreError> {
        let concepts = self.concepts.read();
        let mut versions = concepts
            .get(name)
            .map(|r| r.versions.clone())
            .unwrap_or_default();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn version_as_of(
        &self,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConceptVersion>, StoreError> {
        let concepts = self.concepts.read();
        Ok(concepts.get(name).and_then(|r| {
            r.versions
                .iter()
                .filter(|v| v.covers(at))
                .max_by_key(|v| v.version)
                .cloned()
        }))
    }

    async fn parent_edges(
        &self,
        name: &str,
        version: i64,
    ) -> Result<Vec<EvolutionEdge>, StoreError> {
        let edges = self.edges.read();
        Ok(edges
            .get(name)
            .map(|children| {
                children
                    .iter()
                    .filter(|c| c.child_version == version)
                    .flat_map(|c| c.edges.iter().cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::EvolutionType;
    use std::sync::Arc;

    fn draft(name: &str, embedding: Option<Vec<f32>>) -> VersionDraft {
        let now = Utc::now();
        VersionDraft {
            name: name.to_string(),
            description: format!("{name} description"),
            embedding,
            valid_from: now,
            transaction_from: now,
            context: None,
        }
    }

    fn link(name: &str, version: i64) -> ParentLink {
        ParentLink {
            parent: ParentVersion { name: name.to_string(), version },
            evolution_type: EvolutionType::Refinement,
            confidence: 0.8,
            explanation: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_versions_are_gap_free_and_start_at_one() {
        let store = MemoryGraphStore::new();
        for _ in 0..3 {
            store.commit_version(&draft("a", None), &[]).await.unwrap();
        }
        let history = store.version_history("a").await.unwrap();
        let numbers: Vec<i64> = history.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_single_current_row_per_name() {
        let store = MemoryGraphStore::new();
        for _ in 0..4 {
            store.commit_version(&draft("a", None), &[]).await.unwrap();
        }
        let history = store.version_history("a").await.unwrap();
        let current: Vec<_> = history.iter().filter(|v| v.is_current()).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].version, 4);
        assert_eq!(store.current_version_of("a"), Some(4));
    }

    #[tokio::test]
    async fn test_concurrent_commits_same_name_no_duplicates() {
        let store = Arc::new(MemoryGraphStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.commit_version(&draft("a", None), &[]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let numbers: Vec<i64> = store
            .version_history("a")
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, (1..=8).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_similar_concepts_current_only_descending() {
        let store = MemoryGraphStore::new();
        // two versions of "a": only v2 is current
        store
            .commit_version(&draft("a", Some(vec![1.0, 0.0])), &[])
            .await
            .unwrap();
        store
            .commit_version(&draft("a", Some(vec![0.0, 1.0])), &[])
            .await
            .unwrap();
        store
            .commit_version(&draft("b", Some(vec![0.9, 0.1])), &[])
            .await
            .unwrap();

        let matches = store.similar_concepts(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(matches.len(), 2);
        // b's current vector is closest to the query; a's current (v2) is orthogonal
        assert_eq!(matches[0].name, "b");
        assert_eq!(matches[1].name, "a");
        assert_eq!(matches[1].version, 2);
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn test_commit_with_parent_edges() {
        let store = MemoryGraphStore::new();
        store.commit_version(&draft("parent", None), &[]).await.unwrap();
        let receipt = store
            .commit_version(&draft("child", None), &[link("parent", 1)])
            .await
            .unwrap();
        assert!(receipt.skipped_parents.is_empty());

        let edges = store.parent_edges("child", 1).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].parent_name, "parent");
        assert_eq!(edges[0].parent_version, 1);
        assert_eq!(edges[0].evolution_type, EvolutionType::Refinement);
    }

    #[tokio::test]
    async fn test_dangling_parent_skipped_version_still_created() {
        let store = MemoryGraphStore::new();
        let receipt = store
            .commit_version(&draft("child", None), &[link("ghost", 7)])
            .await
            .unwrap();
        assert_eq!(receipt.version.version, 1);
        assert_eq!(receipt.skipped_parents.len(), 1);
        assert_eq!(receipt.skipped_parents[0].name, "ghost");
        assert!(store.parent_edges("child", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_version_as_of() {
        let store = MemoryGraphStore::new();
        let mut d = draft("a", None);
        store.commit_version(&d, &[]).await.unwrap();
        let t1 = d.transaction_from;

        d.transaction_from = t1 + chrono::Duration::seconds(10);
        d.valid_from = d.transaction_from;
        d.description = "updated".to_string();
        store.commit_version(&d, &[]).await.unwrap();

        // before anything existed
        let before = t1 - chrono::Duration::seconds(10);
        assert!(store.version_as_of("a", before).await.unwrap().is_none());

        // between v1 and v2: v1 was the recorded belief
        let mid = t1 + chrono::Duration::seconds(5);
        let v = store.version_as_of("a", mid).await.unwrap().unwrap();
        assert_eq!(v.version, 1);

        // after v2
        let late = t1 + chrono::Duration::seconds(60);
        let v = store.version_as_of("a", late).await.unwrap().unwrap();
        assert_eq!(v.version, 2);
        assert_eq!(v.description, "updated");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let store = MemoryGraphStore::new();
        let err = store.commit_version(&draft("  ", None), &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }
}
