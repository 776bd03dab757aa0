use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::scoring::{cosine_similarity, sort_by_relevance};
use crate::analysis::models::RankingsResponse;
use crate::analysis::prompts::{RANKING_SYSTEM_PROMPT, build_ranking_prompt};
use crate::core::models::{ConceptInput, ConceptMatch};
use crate::llm::providers::base::LlmProvider;

/// One reordering stage. Stages may rewrite the transient `similarity`
/// field but never drop, duplicate or rename candidates — the final
/// top-k cut belongs to the chain, so a candidate demoted by one stage
/// can still be rescued by the next.
#[async_trait]
pub trait RerankStage: Send + Sync {
    async fn rerank(&self, query: &ConceptInput, matches: Vec<ConceptMatch>) -> Vec<ConceptMatch>;

    fn stage_name(&self) -> &str;
}

/// Deterministic local cross-scorer: blends embedding cosine
/// similarity with lexical token overlap (Dice coefficient). No oracle
/// involved, so this stage never degrades.
pub struct CrossScoreStage {
    token_pattern: Regex,
}

impl Default for CrossScoreStage {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossScoreStage {
    pub fn new() -> Self {
        Self {
            token_pattern: Regex::new(r"[a-z0-9]+").expect("static pattern"),
        }
    }

    fn tokens(&self, text: &str) -> HashSet<String> {
        self.token_pattern
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn lexical_overlap(&self, a: &str, b: &str) -> f64 {
        let ta = self.tokens(a);
        let tb = self.tokens(b);
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }
        let shared = ta.intersection(&tb).count();
        (2.0 * shared as f64) / (ta.len() + tb.len()) as f64
    }

    fn cross_score(&self, query: &ConceptInput, candidate: &ConceptMatch) -> f64 {
        let query_text = format!("{} {}", query.name, query.description);
        let candidate_text = format!("{} {}", candidate.name, candidate.description);
        let lexical = self.lexical_overlap(&query_text, &candidate_text);

        match (query.embedding.as_deref(), candidate.embedding.as_deref()) {
            (Some(q), Some(c)) => 0.5 * cosine_similarity(q, c) + 0.5 * lexical,
            _ => lexical,
        }
    }
}

#[async_trait]
impl RerankStage for CrossScoreStage {
    async fn rerank(&self, query: &ConceptInput, mut matches: Vec<ConceptMatch>) -> Vec<ConceptMatch> {
        for m in &mut matches {
            m.similarity = Some(self.cross_score(query, m));
        }
        sort_by_relevance(&mut matches);
        matches
    }

    fn stage_name(&self) -> &str {
        "cross-score"
    }
}

/// Oracle-judged rerank: one request carrying the whole candidate set,
/// parsed as a name-keyed rankings mapping.
///
/// A candidate missing from the mapping keeps its prior-stage
/// similarity (falling back to the retrieval score only when no stage
/// has scored it yet) — it is never dropped and never zeroed. Oracle
/// or parse failure leaves the prior ordering untouched.
pub struct LlmRerankStage {
    llm: Arc<dyn LlmProvider>,
}

impl LlmRerankStage {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    fn apply_rankings(matches: &mut [ConceptMatch], rankings: &RankingsResponse) {
        for m in matches.iter_mut() {
            if let Some(ranked) = rankings.rankings.get(&m.name) {
                m.similarity = Some(ranked.relevance);
            } else if m.similarity.is_none() {
                m.similarity = Some(m.score);
            }
        }
    }
}

#[async_trait]
impl RerankStage for LlmRerankStage {
    async fn rerank(&self, query: &ConceptInput, mut matches: Vec<ConceptMatch>) -> Vec<ConceptMatch> {
        if matches.is_empty() {
            return matches;
        }

        let prompt = build_ranking_prompt(query, &matches);

        let response = match self
            .llm
            .generate(RANKING_SYSTEM_PROMPT, &prompt, Some("json_object"))
            .await
        {
            Ok((content, _metadata)) => content,
            Err(e) => {
                warn!("Rerank oracle call failed, keeping prior order: {}", e);
                sort_by_relevance(&mut matches);
                return matches;
            }
        };

        match serde_json::from_str::<RankingsResponse>(&response) {
            Ok(rankings) => {
                Self::apply_rankings(&mut matches, &rankings);
            }
            Err(e) => {
                warn!(
                    "Unparseable rankings ({}), keeping prior order: {}",
                    e,
                    crate::safe_truncate_ellipsis(&response, 120)
                );
            }
        }

        sort_by_relevance(&mut matches);
        matches
    }

    fn stage_name(&self) -> &str {
        "llm-judged"
    }
}

/// Sequential reranker chain. Each stage consumes the previous stage's
/// ordering; the cut to `top_k` happens once, after the last stage.
pub struct RerankerChain {
    stages: Vec<Box<dyn RerankStage>>,
    top_k: usize,
}

impl RerankerChain {
    pub fn new(stages: Vec<Box<dyn RerankStage>>, top_k: usize) -> Self {
        Self { stages, top_k }
    }

    pub async fn rerank(&self, query: &ConceptInput, mut matches: Vec<ConceptMatch>) -> Vec<ConceptMatch> {
        for stage in &self.stages {
            debug!("Rerank stage {} ({} candidates)", stage.stage_name(), matches.len());
            matches = stage.rerank(query, matches).await;
        }
        matches.truncate(self.top_k);
        matches
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedLlm, match_named};

    fn query_with_embedding(embedding: Vec<f32>) -> ConceptInput {
        let mut q = ConceptInput::new("note graph", "knowledge graph for notes");
        q.embedding = Some(embedding);
        q
    }

    #[tokio::test]
    async fn test_cross_score_prefers_lexical_match() {
        let stage = CrossScoreStage::new();
        let query = ConceptInput::new("note graph", "knowledge graph for notes");
        let mut close = match_named("graph notes", 1, 0.1);
        close.description = "a knowledge graph that stores notes".to_string();
        let far = match_named("bread recipe", 1, 0.9);

        let result = stage.rerank(&query, vec![far, close]).await;
        assert_eq!(result[0].name, "graph notes");
        assert!(result[0].similarity.unwrap() > result[1].similarity.unwrap());
    }

    #[tokio::test]
    async fn test_cross_score_blends_embeddings_when_present() {
        let stage = CrossScoreStage::new();
        let query = query_with_embedding(vec![1.0, 0.0]);
        let mut aligned = match_named("unrelated words", 1, 0.0);
        aligned.embedding = Some(vec![1.0, 0.0]);
        let plain = match_named("other words", 1, 0.0);

        let result = stage.rerank(&query, vec![plain, aligned]).await;
        assert_eq!(result[0].name, "unrelated words");
    }

    #[tokio::test]
    async fn test_llm_stage_applies_rankings() {
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"rankings":{"a":{"relevance":0.2,"explanation":"weak"},"b":{"relevance":0.95,"explanation":"strong"}}}"#,
        )]);
        let stage = LlmRerankStage::new(Arc::new(llm));
        let query = ConceptInput::new("q", "query");
        let result = stage
            .rerank(&query, vec![match_named("a", 1, 0.9), match_named("b", 1, 0.3)])
            .await;
        assert_eq!(result[0].name, "b");
        assert_eq!(result[0].similarity, Some(0.95));
    }

    #[tokio::test]
    async fn test_llm_stage_missing_candidate_keeps_prior_score() {
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"rankings":{"a":{"relevance":0.4,"explanation":"ok"}}}"#,
        )]);
        let stage = LlmRerankStage::new(Arc::new(llm));
        let query = ConceptInput::new("q", "query");
        let mut b = match_named("b", 1, 0.3);
        b.similarity = Some(0.85); // prior-stage score survives
        let result = stage.rerank(&query, vec![match_named("a", 1, 0.9), b]).await;
        assert_eq!(result[0].name, "b");
        assert_eq!(result[0].similarity, Some(0.85));
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_llm_stage_failure_keeps_prior_order() {
        let stage = LlmRerankStage::new(Arc::new(ScriptedLlm::new(vec![Err("down")])));
        let query = ConceptInput::new("q", "query");
        let mut a = match_named("a", 1, 0.9);
        a.similarity = Some(0.9);
        let mut b = match_named("b", 1, 0.3);
        b.similarity = Some(0.3);
        let result = stage.rerank(&query, vec![a, b]).await;
        assert_eq!(result[0].name, "a");
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_chain_cuts_only_at_end() {
        // Stage B rescues a candidate Stage A demoted; a per-stage cut
        // of 1 would have dropped it before the rescue.
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"rankings":{"rescued":{"relevance":0.99,"explanation":"best"},"graph notes":{"relevance":0.1,"explanation":"weak"}}}"#,
        )]);
        let chain = RerankerChain::new(
            vec![
                Box::new(CrossScoreStage::new()),
                Box::new(LlmRerankStage::new(Arc::new(llm))),
            ],
            1,
        );
        let query = ConceptInput::new("note graph", "knowledge graph for notes");
        let mut lexical_winner = match_named("graph notes", 1, 0.5);
        lexical_winner.description = "knowledge graph for notes".to_string();
        let rescued = match_named("rescued", 1, 0.5);

        let result = chain.rerank(&query, vec![lexical_winner, rescued]).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "rescued");
    }

    #[tokio::test]
    async fn test_empty_input_passes_through() {
        let chain = RerankerChain::new(vec![Box::new(CrossScoreStage::new())], 3);
        let result = chain.rerank(&ConceptInput::new("q", "d"), Vec::new()).await;
        assert!(result.is_empty());
    }
}
