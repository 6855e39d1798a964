//! lexgraph-retrieval - Hybrid contract retrieval with Reciprocal Rank Fusion.
//!
//! Module layout:
//! - `vector` / `memory_index`: `VectorSearchClient` seam and in-memory index
//! - `flatten`: graph context → weighted evidence items
//! - `fusion`: RRF kernels and token estimate
//! - `retriever`: `HybridRetriever` (semantic stage, bounded graph fan-out, merge, rank)
//! - `cache`: `CachedRetriever` side-car response cache
//! - `settings` / `config`: YAML settings and resolved configuration
//! - `context`: `RetrievalContext` threaded into constructors

mod cache;
mod config;
mod context;
mod error;
mod flatten;
mod fusion;
mod memory_index;
mod retriever;
mod settings;
mod types;
mod vector;

pub use cache::{CacheStatsSnapshot, CachedRetriever};
pub use config::{CacheConfig, DEFAULT_N_GRAPH, DEFAULT_N_SEMANTIC, HybridRetrieverConfig};
pub use context::RetrievalContext;
pub use error::{BackingStore, RetrievalError};
pub use flatten::{FlattenOptions, GraphItem, GraphItemKind, ItemWeights, flatten_context};
pub use fusion::{DEFAULT_RRF_K, apply_rrf, estimate_tokens, rrf_term};
pub use memory_index::{Chunk, HashingEncoder, InMemoryVectorIndex, cosine_similarity};
pub use retriever::{HybridRetriever, RetrieveOptions, Retriever};
pub use settings::{
    CacheSettings, RetrievalSection, RetrievalSettings, WeightSettings, load_retrieval_settings,
    load_retrieval_settings_from_paths, retrieval_settings_paths, set_config_home_override,
};
pub use types::{HybridRetrievalResponse, RetrievalResult, RetrievalSource};
pub use vector::{CONTRACT_ID_KEY, SemanticHit, VectorSearchClient, VectorSearchError};
