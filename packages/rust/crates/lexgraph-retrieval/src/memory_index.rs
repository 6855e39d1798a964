//! In-memory vector index for local runs and tests.
//!
//! Chunks are embedded with a feature-hashing bag-of-words encoder, so texts
//! sharing words land close together. Not a replacement for a real embedding model.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::vector::{CONTRACT_ID_KEY, SemanticHit, VectorSearchClient, VectorSearchError};

const DEFAULT_DIMENSION: usize = 512;

/// A document chunk to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk id.
    pub id: String,
    /// Owning contract.
    pub contract_id: String,
    /// Chunk text.
    pub text: String,
    /// Extra metadata returned with hits.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Feature-hashing bag-of-words encoder.
#[derive(Debug, Clone, Copy)]
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    /// Create an encoder with `dimension` buckets (at least 1).
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Encode text into an L2-normalized term-count vector.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];
        let buckets = u64::try_from(self.dimension).unwrap_or(u64::MAX);
        for token in tokens(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = usize::try_from(hasher.finish() % buckets).unwrap_or(0);
            embedding[bucket] += 1.0;
        }
        normalize(embedding)
    }

    /// Embedding dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn normalize(v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v;
    }
    v.into_iter().map(|x| x / norm).collect()
}

/// Cosine similarity of two equal-length vectors; 0 for mismatched or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Reference [`VectorSearchClient`] over chunks held in memory.
///
/// Cheap to clone; clones share the same index.
#[derive(Clone, Default)]
pub struct InMemoryVectorIndex {
    encoder: HashingEncoder,
    chunks: Arc<RwLock<Vec<IndexedChunk>>>,
}

impl std::fmt::Debug for InMemoryVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorIndex")
            .field("dimension", &self.encoder.dimension())
            .finish_non_exhaustive()
    }
}

impl InMemoryVectorIndex {
    /// Create an empty index with the default encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with a custom encoder.
    #[must_use]
    pub fn with_encoder(encoder: HashingEncoder) -> Self {
        Self {
            encoder,
            chunks: Arc::default(),
        }
    }

    /// Embed and add a chunk.
    pub async fn add(&self, chunk: Chunk) {
        let embedding = self.encoder.encode(&chunk.text);
        self.chunks
            .write()
            .await
            .push(IndexedChunk { chunk, embedding });
    }

    /// Embed and add several chunks.
    pub async fn extend(&self, chunks: impl IntoIterator<Item = Chunk>) {
        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .map(|chunk| IndexedChunk {
                embedding: self.encoder.encode(&chunk.text),
                chunk,
            })
            .collect();
        self.chunks.write().await.extend(indexed);
    }

    /// Number of indexed chunks.
    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    /// True when nothing is indexed.
    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

#[async_trait]
impl VectorSearchClient for InMemoryVectorIndex {
    async fn semantic_search(
        &self,
        query: &str,
        contract_id: Option<&str>,
        n_results: usize,
    ) -> Result<Vec<SemanticHit>, VectorSearchError> {
        if n_results == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.encoder.encode(query);
        let contract_filter = contract_id.map(str::trim);
        let chunks = self.chunks.read().await;

        let mut scored: Vec<(f32, &Chunk)> = chunks
            .iter()
            .filter(|indexed| contract_filter.is_none_or(|id| indexed.chunk.contract_id == id))
            .map(|indexed| {
                let score = cosine_similarity(&query_embedding, &indexed.embedding);
                (score.clamp(0.0, 1.0), &indexed.chunk)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(n_results);

        Ok(scored
            .into_iter()
            .map(|(relevance_score, chunk)| {
                let mut metadata = chunk.metadata.clone();
                metadata.insert(
                    CONTRACT_ID_KEY.to_string(),
                    Value::String(chunk.contract_id.clone()),
                );
                SemanticHit {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    metadata,
                    relevance_score,
                }
            })
            .collect())
    }
}
