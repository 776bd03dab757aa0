//! Scoring utilities shared by the similarity scan and the rerankers.

use crate::core::models::ConceptMatch;

/// Cosine similarity, the main metric for embedding comparison.
/// Mismatched or zero-magnitude vectors score 0.0 instead of erroring.
pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> f64 {
    if vec1.len() != vec2.len() || vec1.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    let mag1: f32 = vec1.iter().map(|a| a * a).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|b| b * b).sum::<f32>().sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    (dot_product / (mag1 * mag2)) as f64
}

/// Stable descending sort by the most recently assigned relevance.
/// Ties keep input order; `total_cmp` gives NaN a defined place
/// instead of a panicking comparator.
pub fn sort_by_relevance(matches: &mut [ConceptMatch]) {
    matches.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
}
