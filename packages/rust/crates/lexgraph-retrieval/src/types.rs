//! Result types produced by hybrid retrieval.

use serde::Serialize;
use serde_json::{Map, Value};

/// Which retrieval path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    /// Embedding-similarity search over chunks.
    Semantic,
    /// Graph context traversal.
    Graph,
}

impl std::fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalSource::Semantic => write!(f, "semantic"),
            RetrievalSource::Graph => write!(f, "graph"),
        }
    }
}

/// One piece of evidence in the fused ranking.
///
/// At least one of the semantic score and the graph relevance is always set;
/// the constructors are the only way to build a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    /// Owning contract id; empty when the chunk carried none.
    pub contract_id: String,
    /// Evidence text.
    pub content: String,
    /// Producing path.
    pub source: RetrievalSource,
    semantic_score: Option<f32>,
    graph_relevance: Option<f32>,
    rrf_score: f32,
    /// Free-form metadata (`type` for graph items, chunk metadata for semantic hits).
    pub metadata: Map<String, Value>,
}

/// Clamp into `[0, 1]`; NaN becomes 0.
fn unit(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

impl RetrievalResult {
    /// Semantic-origin result.
    #[must_use]
    pub fn semantic(
        contract_id: impl Into<String>,
        content: impl Into<String>,
        semantic_score: f32,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            content: content.into(),
            source: RetrievalSource::Semantic,
            semantic_score: Some(unit(semantic_score)),
            graph_relevance: None,
            rrf_score: 0.0,
            metadata,
        }
    }

    /// Graph-origin result.
    #[must_use]
    pub fn graph(
        contract_id: impl Into<String>,
        content: impl Into<String>,
        graph_relevance: f32,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            content: content.into(),
            source: RetrievalSource::Graph,
            semantic_score: None,
            graph_relevance: Some(unit(graph_relevance)),
            rrf_score: 0.0,
            metadata,
        }
    }

    /// Result corroborated by both paths; it takes part in both RRF orderings.
    #[must_use]
    pub fn dual(
        contract_id: impl Into<String>,
        content: impl Into<String>,
        source: RetrievalSource,
        semantic_score: f32,
        graph_relevance: f32,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            content: content.into(),
            source,
            semantic_score: Some(unit(semantic_score)),
            graph_relevance: Some(unit(graph_relevance)),
            rrf_score: 0.0,
            metadata,
        }
    }

    /// Semantic relevance in `[0, 1]`, when the result came from semantic search.
    #[must_use]
    pub fn semantic_score(&self) -> Option<f32> {
        self.semantic_score
    }

    /// Graph relevance weight in `[0, 1]`, when the result came from the graph.
    #[must_use]
    pub fn graph_relevance(&self) -> Option<f32> {
        self.graph_relevance
    }

    /// Fused score; 0 until ranked.
    #[must_use]
    pub fn rrf_score(&self) -> f32 {
        self.rrf_score
    }

    pub(crate) fn set_rrf_score(&mut self, score: f32) {
        self.rrf_score = score;
    }

    /// `type` metadata tag, if any (`company`, `clause`, `risk`, `metadata`).
    #[must_use]
    pub fn item_type(&self) -> Option<&str> {
        self.metadata.get("type").and_then(Value::as_str)
    }
}

/// Fused, ranked output of one retrieval call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HybridRetrievalResponse {
    /// All results, by `rrf_score` descending; ties keep merge order.
    pub results: Vec<RetrievalResult>,
    /// Number of semantic-origin results.
    pub semantic_count: usize,
    /// Number of graph-origin results.
    pub graph_count: usize,
    /// `floor(total content chars / 4)`.
    pub total_tokens_estimate: usize,
}

impl HybridRetrievalResponse {
    /// True when nothing was retrieved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::{RetrievalResult, RetrievalSource};

    #[test]
    fn test_constructors_set_exactly_their_scores() {
        let semantic = RetrievalResult::semantic("c1", "text", 0.8, Map::new());
        assert_eq!(semantic.semantic_score(), Some(0.8));
        assert_eq!(semantic.graph_relevance(), None);
        assert_eq!(semantic.rrf_score(), 0.0);

        let graph = RetrievalResult::graph("c1", "text", 0.7, Map::new());
        assert_eq!(graph.source, RetrievalSource::Graph);
        assert_eq!(graph.semantic_score(), None);
        assert_eq!(graph.graph_relevance(), Some(0.7));
    }

    #[test]
    fn test_scores_are_clamped() {
        let high = RetrievalResult::semantic("c1", "text", 1.4, Map::new());
        assert_eq!(high.semantic_score(), Some(1.0));
        let nan = RetrievalResult::graph("c1", "text", f32::NAN, Map::new());
        assert_eq!(nan.graph_relevance(), Some(0.0));
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let json = serde_json::to_string(&RetrievalSource::Semantic).unwrap_or_default();
        assert_eq!(json, "\"semantic\"");
    }
}
