//! Reciprocal Rank Fusion over semantic and graph orderings.

use crate::types::RetrievalResult;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// RRF term for a 0-based rank: `1 / (k + rank + 1)`.
#[inline]
#[must_use]
pub fn rrf_term(k: f32, rank: usize) -> f32 {
    let rank_f32 = f32::from(u16::try_from(rank).unwrap_or(u16::MAX));
    1.0 / (k + rank_f32 + 1.0)
}

/// Indices of results carrying a score, best-first; equal scores keep input order.
fn ordering(
    results: &[RetrievalResult],
    score: impl Fn(&RetrievalResult) -> Option<f32>,
) -> Vec<usize> {
    let mut ranked: Vec<(usize, f32)> = results
        .iter()
        .enumerate()
        .filter_map(|(index, result)| score(result).map(|s| (index, s)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(index, _)| index).collect()
}

/// Score every result by RRF and return them by `rrf_score` descending.
///
/// Two orderings are built: results with a semantic score and results with a
/// graph relevance. A result accumulates one term per ordering it appears in.
/// The final sort is stable, so ties keep input order.
#[must_use]
pub fn apply_rrf(mut results: Vec<RetrievalResult>, k: f32) -> Vec<RetrievalResult> {
    let mut scores = vec![0.0_f32; results.len()];
    for ranked in [
        ordering(&results, RetrievalResult::semantic_score),
        ordering(&results, RetrievalResult::graph_relevance),
    ] {
        for (rank, index) in ranked.into_iter().enumerate() {
            scores[index] += rrf_term(k, rank);
        }
    }
    for (result, score) in results.iter_mut().zip(scores) {
        result.set_rrf_score(score);
    }
    results.sort_by(|a, b| b.rrf_score().total_cmp(&a.rrf_score()));
    results
}

/// Token estimate: `floor(total content chars / 4)`.
#[must_use]
pub fn estimate_tokens(results: &[RetrievalResult]) -> usize {
    results
        .iter()
        .map(|result| result.content.chars().count())
        .sum::<usize>()
        / 4
}
