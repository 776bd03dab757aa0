use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::{CommitReceipt, GraphStore, ParentLink, StoreError, VersionDraft};
use crate::analysis::models::ParentVersion;
use crate::core::models::{ConceptMatch, ConceptVersion, EvolutionEdge};
use crate::db::{HelixClient, HelixClientError};

#[derive(Serialize)]
struct SimilarParams<'a> {
    embedding: &'a [f32],
    k: usize,
}

#[derive(Serialize)]
struct CommitParams<'a> {
    draft: &'a VersionDraft,
    parents: &'a [ParentLink],
}

#[derive(Serialize)]
struct NameParams<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct AsOfParams<'a> {
    name: &'a str,
    at: DateTime<Utc>,
}

#[derive(Serialize)]
struct EdgeParams<'a> {
    name: &'a str,
    version: i64,
}

#[derive(Deserialize)]
struct CommitRow {
    version: ConceptVersion,
    #[serde(default)]
    skipped_parents: Vec<ParentVersion>,
}

fn read_error(e: HelixClientError) -> StoreError {
    if e.is_connectivity() {
        StoreError::Unreachable(e.to_string())
    } else {
        StoreError::Query(e.to_string())
    }
}

/// A not-found reply to a read is an answer (no rows), not a failure.
fn absent_ok<T: Default>(
    result: Result<T, HelixClientError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(HelixClientError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(read_error(e)),
    }
}

fn write_error(e: HelixClientError) -> StoreError {
    if e.is_connectivity() {
        StoreError::Unreachable(e.to_string())
    } else {
        // the server ran the transaction and refused it
        StoreError::Rejected(e.to_string())
    }
}

/// [`GraphStore`] backed by the graph database. Each trait method maps
/// to one named server-side query; `commitConceptVersion` performs the
/// whole upsert-allocate-write-close-link sequence in a single
/// transaction, so per-name version allocation is serialized by the
/// server.
pub struct HelixGraphStore {
    client: Arc<HelixClient>,
}

impl HelixGraphStore {
    pub fn new(client: Arc<HelixClient>) -> Self {
        info!("HelixGraphStore initialized for {}", client.base_url());
        Self { client }
    }
}

#[async_trait]
impl GraphStore for HelixGraphStore {
    async fn similar_concepts(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ConceptMatch>, StoreError> {
        debug!("Vector search, k={}", k);
        absent_ok(
            self.client
                .execute_query::<Vec<ConceptMatch>, _>(
                    "similarConcepts",
                    &SimilarParams { embedding, k },
                )
                .await,
        )
    }

    async fn commit_version(
        &self,
        draft: &VersionDraft,
        parents: &[ParentLink],
    ) -> Result<CommitReceipt, StoreError> {
        debug!("Committing {} ({} parents)", draft.name, parents.len());
        let row = self
            .client
            .execute_query::<CommitRow, _>(
                "commitConceptVersion",
                &CommitParams { draft, parents },
            )
            .await
            .map_err(write_error)?;

        Ok(CommitReceipt {
            version: row.version,
            skipped_parents: row.skipped_parents,
        })
    }

    async fn version_history(&self, name: &str) -> Result<Vec<ConceptVersion>, StoreError> {
        let mut versions = absent_ok(
            self.client
                .execute_query::<Vec<ConceptVersion>, _>("conceptHistory", &NameParams { name })
                .await,
        )?;
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn version_as_of(
        &self,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConceptVersion>, StoreError> {
        absent_ok(
            self.client
                .execute_query::<Option<ConceptVersion>, _>(
                    "conceptAsOf",
                    &AsOfParams { name, at },
                )
                .await,
        )
    }

    async fn parent_edges(
        &self,
        name: &str,
        version: i64,
    ) -> Result<Vec<EvolutionEdge>, StoreError> {
        absent_ok(
            self.client
                .execute_query::<Vec<EvolutionEdge>, _>(
                    "parentEdges",
                    &EdgeParams { name, version },
                )
                .await,
        )
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .health_check()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))
    }
}
