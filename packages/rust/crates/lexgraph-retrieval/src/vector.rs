//! Vector search driver seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Metadata key carrying the contract id of a chunk.
pub const CONTRACT_ID_KEY: &str = "contract_id";

/// One chunk returned by a semantic search, best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    /// Chunk id.
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// Chunk metadata (expected to carry `contract_id`).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Pre-normalized relevance in `[0, 1]`; 1 is best.
    pub relevance_score: f32,
}

impl SemanticHit {
    /// Contract id from metadata, if present and non-blank.
    #[must_use]
    pub fn contract_id(&self) -> Option<&str> {
        self.metadata
            .get(CONTRACT_ID_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Errors raised by vector search drivers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VectorSearchError {
    /// The vector store cannot be reached.
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but the search failed.
    #[error("vector search failed: {0}")]
    Query(String),
}

impl VectorSearchError {
    /// True for the "service unavailable" condition a resilience layer may retry.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Embedding-similarity search over document chunks.
#[async_trait]
pub trait VectorSearchClient: Send + Sync {
    /// Up to `n_results` hits, best-first, optionally restricted to one contract.
    async fn semantic_search(
        &self,
        query: &str,
        contract_id: Option<&str>,
        n_results: usize,
    ) -> Result<Vec<SemanticHit>, VectorSearchError>;
}
