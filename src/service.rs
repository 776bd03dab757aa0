use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::analysis::models::{CombinedSummary, CompareResult, EvolutionResult};
use crate::analysis::{ConceptComparator, EvolutionAnalyzer, MergeSynthesizer};
use crate::core::config::IdeaGraphConfig;
use crate::core::error::{IdeaGraphError, Result};
use crate::core::models::{ConceptInput, ConceptMatch, ConceptVersion, EvolutionEdge};
use crate::db::HelixClient;
use crate::llm::embeddings::EmbeddingGenerator;
use crate::llm::factory::{EmbeddingProviderFactory, LlmProviderFactory};
use crate::llm::providers::base::LlmProvider;
use crate::pipeline::committer::{CommitStatus, VersionCommitter};
use crate::pipeline::rerank::{CrossScoreStage, LlmRerankStage, RerankerChain};
use crate::pipeline::retriever::CandidateRetriever;
use crate::store::{GraphStore, HelixGraphStore};
use crate::utils::embedding_text;

/// How an ingestion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Success,
    /// Pipeline ran but the store could not be reached for the commit.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedConcept {
    pub name: String,
    pub version: i64,
}

/// Structured decision summary returned by `submit_idea`, including on
/// degraded paths — the caller is never left without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub evolution: EvolutionResult,
    pub related_concepts: Vec<RelatedConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<ConceptVersion>,
}

/// The exposed operation surface, consumed by a thin transport layer.
/// All collaborators are injected `Arc` handles with explicit
/// lifecycle; nothing here is process-global.
pub struct ConceptService {
    embeddings: Arc<EmbeddingGenerator>,
    store: Arc<dyn GraphStore>,
    retriever: CandidateRetriever,
    reranker: RerankerChain,
    analyzer: EvolutionAnalyzer,
    comparator: ConceptComparator,
    synthesizer: MergeSynthesizer,
    committer: VersionCommitter,
}

impl ConceptService {
    /// Wire every component from injected collaborators.
    pub fn new(
        embeddings: Arc<EmbeddingGenerator>,
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LlmProvider>,
        config: &IdeaGraphConfig,
    ) -> Result<Self> {
        let retriever = CandidateRetriever::new(
            Arc::clone(&store),
            config.retrieval_k,
            config.embedding_dim,
        )?;

        let reranker = RerankerChain::new(
            vec![
                Box::new(CrossScoreStage::new()),
                Box::new(LlmRerankStage::new(Arc::clone(&llm))),
            ],
            config.rerank_top_k,
        );

        Ok(Self {
            embeddings,
            store: Arc::clone(&store),
            retriever,
            reranker,
            analyzer: EvolutionAnalyzer::new(Arc::clone(&llm), config.classifier_max_candidates),
            comparator: ConceptComparator::new(Arc::clone(&llm)),
            synthesizer: MergeSynthesizer::new(llm),
            committer: VersionCommitter::new(store),
        })
    }

    /// Production wiring: Helix-backed store plus configured providers.
    pub fn from_config(config: &IdeaGraphConfig) -> Result<Self> {
        let client = Arc::new(
            HelixClient::from_config(config)
                .map_err(|e| IdeaGraphError::Connection(e.to_string()))?,
        );
        let store: Arc<dyn GraphStore> = Arc::new(HelixGraphStore::new(client));
        let llm = LlmProviderFactory::create_with_fallback(config)?;
        let embeddings = Arc::new(EmbeddingProviderFactory::from_config(config));
        Self::new(embeddings, store, llm, config)
    }

    /// Full ingestion pipeline: embed, retrieve, rerank, classify,
    /// commit. Stages run strictly in sequence; only the commit writes.
    pub async fn submit_idea(&self, mut idea: ConceptInput) -> Result<IngestReport> {
        info!("Submitting idea: {}", idea.name);

        self.ensure_embedding(&mut idea).await?;
        let embedding = idea.embedding.as_deref().unwrap_or_default();

        let candidates = self.retriever.retrieve(embedding).await?;
        let ranked = self.reranker.rerank(&idea, candidates).await;
        let evolution = self.analyzer.analyze(&idea, &ranked).await;

        let status = self.committer.commit(&idea, &evolution).await?;

        let related_concepts = ranked
            .iter()
            .map(|m| RelatedConcept {
                name: m.name.clone(),
                version: m.version,
            })
            .collect();

        Ok(IngestReport {
            status: if status.is_committed() {
                IngestStatus::Success
            } else {
                IngestStatus::Failed
            },
            evolution,
            related_concepts,
            version: match status {
                CommitStatus::Committed(v) => Some(v),
                CommitStatus::StoreUnavailable => None,
            },
        })
    }

    /// Raw nearest-neighbour candidates, no reranking.
    pub async fn similar_ideas(&self, mut idea: ConceptInput) -> Result<Vec<ConceptMatch>> {
        self.ensure_embedding(&mut idea).await?;
        let embedding = idea.embedding.as_deref().unwrap_or_default();
        self.retriever.retrieve(embedding).await
    }

    /// Candidates after the full reranker chain and top-k cut.
    pub async fn similar_ideas_reranked(&self, mut idea: ConceptInput) -> Result<Vec<ConceptMatch>> {
        self.ensure_embedding(&mut idea).await?;
        let embedding = idea.embedding.as_deref().unwrap_or_default();
        let candidates = self.retriever.retrieve(embedding).await?;
        Ok(self.reranker.rerank(&idea, candidates).await)
    }

    /// Three-way pairwise comparison of two concepts.
    pub async fn compare_concepts(
        &self,
        new: &ConceptInput,
        existing: &ConceptMatch,
    ) -> Result<CompareResult> {
        self.comparator.compare(new, existing).await
    }

    /// Lossless merge of two concept descriptions.
    pub async fn merge_concepts(
        &self,
        new: &ConceptInput,
        existing: &ConceptMatch,
    ) -> Result<CombinedSummary> {
        self.synthesizer.merge(new, existing).await
    }

    /// Direct creation without classification: empty lineage, next
    /// version for the name. Re-creating an existing name advances its
    /// version rather than duplicating version 1.
    pub async fn create_concept(&self, mut concept: ConceptInput) -> Result<ConceptVersion> {
        self.ensure_embedding(&mut concept).await?;

        let evolution = EvolutionResult {
            parent_versions: Vec::new(),
            evolution_type: Default::default(),
            confidence: 1.0,
            explanation: "created directly".to_string(),
        };

        match self.committer.commit(&concept, &evolution).await? {
            CommitStatus::Committed(version) => Ok(version),
            CommitStatus::StoreUnavailable => Err(IdeaGraphError::Connection(
                "store unreachable, concept not created".to_string(),
            )),
        }
    }

    /// Every version of a concept, ascending.
    pub async fn concept_history(&self, name: &str) -> Result<Vec<ConceptVersion>> {
        Ok(self.store.version_history(name).await?)
    }

    /// The concept's state as both time axes saw it at `at`.
    pub async fn concept_as_of(&self, name: &str, at: DateTime<Utc>) -> Result<ConceptVersion> {
        self.store
            .version_as_of(name, at)
            .await?
            .ok_or_else(|| {
                IdeaGraphError::ConceptNotFound(format!("{name} at {at}"))
            })
    }

    /// EVOLVED_FROM lineage out of one concept version.
    pub async fn concept_lineage(&self, name: &str, version: i64) -> Result<Vec<EvolutionEdge>> {
        Ok(self.store.parent_edges(name, version).await?)
    }

    pub async fn health_check(&self) -> Result<()> {
        Ok(self.store.health_check().await?)
    }

    /// A concept cannot be placed in the graph without its vector, so
    /// an embedding failure fails the whole operation.
    async fn ensure_embedding(&self, idea: &mut ConceptInput) -> Result<()> {
        if idea.embedding.is_some() {
            return Ok(());
        }
        debug!("Generating embedding for {}", idea.name);
        let text = embedding_text(&idea.name, &idea.description);
        let embedding = self.embeddings.generate(&text, true).await?;
        idea.embedding = Some(embedding);
        Ok(())
    }
}
