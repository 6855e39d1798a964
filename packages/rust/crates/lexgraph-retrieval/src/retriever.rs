//! Hybrid retriever: semantic search, per-contract graph fan-out, RRF fusion.
//!
//! One `retrieve` call runs these stages:
//! 1. semantic search (capped at `n_semantic`)
//! 2. contract discovery from hit metadata, plus the requested contract
//! 3. bounded parallel graph fetch per discovered contract
//! 4. merge (semantic first, then graph items in discovery order)
//! 5. RRF re-rank and token estimate

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lexgraph_graph::{ContextOptions, GraphContext, GraphContextRetriever, GraphError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::error::Elapsed;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_N_GRAPH, DEFAULT_N_SEMANTIC, HybridRetrieverConfig};
use crate::error::{BackingStore, RetrievalError};
use crate::flatten::{FlattenOptions, GraphItem, flatten_context};
use crate::fusion::{apply_rrf, estimate_tokens};
use crate::types::{HybridRetrievalResponse, RetrievalResult};
use crate::vector::{SemanticHit, VectorSearchClient};

/// Per-call retrieval options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetrieveOptions {
    /// Restrict semantic search to one contract; it also always gets graph coverage.
    pub contract_id: Option<String>,
    /// Semantic hit cap.
    pub n_semantic: usize,
    /// Per-kind graph item cap.
    pub n_graph: usize,
    /// Emit company items.
    pub include_companies: bool,
    /// Emit risk items.
    pub include_risks: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            contract_id: None,
            n_semantic: DEFAULT_N_SEMANTIC,
            n_graph: DEFAULT_N_GRAPH,
            include_companies: true,
            include_risks: true,
        }
    }
}

impl RetrieveOptions {
    /// Builder: scope to one contract.
    #[must_use]
    pub fn for_contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    /// Builder: set both caps.
    #[must_use]
    pub fn with_limits(mut self, n_semantic: usize, n_graph: usize) -> Self {
        self.n_semantic = n_semantic;
        self.n_graph = n_graph;
        self
    }
}

/// Anything that answers a query with a fused ranking.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve and rank evidence for `query`.
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<HybridRetrievalResponse, RetrievalError>;
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<HybridRetrievalResponse, RetrievalError> {
        (**self).retrieve(query, options).await
    }
}

/// The fusion engine.
#[derive(Clone)]
pub struct HybridRetriever {
    vector: Arc<dyn VectorSearchClient>,
    graph: GraphContextRetriever,
    config: HybridRetrieverConfig,
}

impl std::fmt::Debug for HybridRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

type FetchOutcome = Result<Result<Option<GraphContext>, GraphError>, Elapsed>;

impl HybridRetriever {
    /// Create a retriever.
    #[must_use]
    pub fn new(
        vector: Arc<dyn VectorSearchClient>,
        graph: GraphContextRetriever,
        config: HybridRetrieverConfig,
    ) -> Self {
        Self {
            vector,
            graph,
            config,
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &HybridRetrieverConfig {
        &self.config
    }

    /// Options carrying this retriever's configured default caps.
    #[must_use]
    pub fn default_options(&self) -> RetrieveOptions {
        RetrieveOptions {
            n_semantic: self.config.n_semantic,
            n_graph: self.config.n_graph,
            ..RetrieveOptions::default()
        }
    }

    /// Retrieve evidence from both paths and fuse it.
    ///
    /// The result list is never truncated; budget truncation is the caller's job.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::InvalidArgument`] for a blank `contract_id`
    /// - [`RetrievalError::BackingStoreUnavailable`] when either store is unreachable
    /// - [`RetrievalError::SemanticSearch`] when the vector search itself fails
    pub async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<HybridRetrievalResponse, RetrievalError> {
        let requested = match options.contract_id.as_deref().map(str::trim) {
            Some("") => {
                return Err(RetrievalError::InvalidArgument(
                    "contract_id must not be empty".to_string(),
                ));
            }
            other => other,
        };

        let hits = self
            .vector
            .semantic_search(query, requested, options.n_semantic)
            .await
            .inspect_err(|error| {
                if error.is_unavailable() {
                    warn!(
                        event = "retrieval.vector.unavailable",
                        error = %error,
                        "vector store unavailable"
                    );
                }
            })?;
        debug!(
            event = "retrieval.semantic.completed",
            hits = hits.len(),
            contract_id = requested.unwrap_or_default(),
            "semantic stage completed"
        );

        let contract_ids = discover_contracts(&hits, requested);
        let graph_items = self.fetch_graph_items(&contract_ids, options).await?;

        let semantic_count = hits.len();
        let graph_count: usize = graph_items.iter().map(Vec::len).sum();
        let mut results = Vec::with_capacity(semantic_count + graph_count);
        results.extend(hits.into_iter().map(|hit| semantic_result(hit, requested)));
        results.extend(
            graph_items
                .into_iter()
                .flatten()
                .map(GraphItem::into_result),
        );

        let results = apply_rrf(results, self.config.rrf_k);
        let total_tokens_estimate = estimate_tokens(&results);
        info!(
            event = "retrieval.fused",
            semantic_count,
            graph_count,
            contracts = contract_ids.len(),
            total_tokens_estimate,
            "hybrid retrieval completed"
        );

        Ok(HybridRetrievalResponse {
            results,
            semantic_count,
            graph_count,
            total_tokens_estimate,
        })
    }

    /// One graph fetch per contract, bounded by the permit count.
    ///
    /// Slot `i` of the output holds the items of `contract_ids[i]`, independent of
    /// completion order. Degraded fetches leave their slot empty.
    async fn fetch_graph_items(
        &self,
        contract_ids: &[String],
        options: &RetrieveOptions,
    ) -> Result<Vec<Vec<GraphItem>>, RetrievalError> {
        let mut slots: Vec<Vec<GraphItem>> = vec![Vec::new(); contract_ids.len()];
        if contract_ids.is_empty() {
            return Ok(slots);
        }

        let permits = self.config.max_concurrent_graph_fetches.max(1);
        debug!(
            event = "retrieval.graph.fanout",
            contracts = contract_ids.len(),
            permits,
            "starting graph fan-out"
        );
        let semaphore = Arc::new(Semaphore::new(permits));
        let context_options = ContextOptions {
            include_companies: options.include_companies,
            include_clauses: true,
            include_risks: options.include_risks,
            max_clauses: self.config.max_clauses,
        };
        let timeout = self.config.graph_fetch_timeout;

        let mut fetches: JoinSet<(usize, FetchOutcome)> = JoinSet::new();
        for (index, contract_id) in contract_ids.iter().enumerate() {
            let graph = self.graph.clone();
            let semaphore = Arc::clone(&semaphore);
            let contract_id = contract_id.clone();
            fetches.spawn(async move {
                let outcome =
                    fetch_one(&graph, &semaphore, &contract_id, &context_options, timeout).await;
                (index, outcome)
            });
        }

        let flatten = FlattenOptions {
            n_graph: options.n_graph,
            include_companies: options.include_companies,
            include_risks: options.include_risks,
        };
        while let Some(joined) = fetches.join_next().await {
            let (index, outcome) = match joined {
                Ok(joined) => joined,
                Err(join_error) => {
                    warn!(
                        event = "retrieval.graph.task_failed",
                        error = %join_error,
                        "graph fetch task failed; contract contributes no graph items"
                    );
                    continue;
                }
            };
            let contract_id = contract_ids[index].as_str();
            match outcome {
                Ok(Ok(Some(context))) => {
                    slots[index] = flatten_context(&context, flatten, &self.config.weights);
                }
                Ok(Ok(None)) => {
                    debug!(
                        event = "retrieval.graph.not_found",
                        contract_id, "no graph context for contract"
                    );
                }
                Ok(Err(GraphError::Unavailable(message))) => {
                    fetches.abort_all();
                    warn!(
                        event = "retrieval.graph.unavailable",
                        contract_id,
                        error = %message,
                        "graph store unavailable; aborting fan-out"
                    );
                    return Err(RetrievalError::BackingStoreUnavailable {
                        store: BackingStore::Graph,
                        message,
                    });
                }
                Ok(Err(error)) => {
                    warn!(
                        event = "retrieval.graph.degraded",
                        contract_id,
                        error = %error,
                        "graph fetch failed; contract contributes no graph items"
                    );
                }
                Err(_) => {
                    warn!(
                        event = "retrieval.graph.timeout",
                        contract_id,
                        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        "graph fetch timed out; contract contributes no graph items"
                    );
                }
            }
        }
        Ok(slots)
    }
}

async fn fetch_one(
    graph: &GraphContextRetriever,
    semaphore: &Arc<Semaphore>,
    contract_id: &str,
    options: &ContextOptions,
    timeout: Duration,
) -> FetchOutcome {
    // The semaphore is never closed; the permit is held for the whole fetch.
    let _permit = Arc::clone(semaphore).acquire_owned().await;
    tokio::time::timeout(timeout, graph.get_context_for_contract(contract_id, options)).await
}

/// Distinct contract ids in first-appearance order; `requested` is appended if absent.
fn discover_contracts(hits: &[SemanticHit], requested: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    let hit_ids = hits.iter().filter_map(|hit| hit.contract_id().or(requested));
    for id in hit_ids.chain(requested) {
        if seen.insert(id) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn semantic_result(hit: SemanticHit, requested: Option<&str>) -> RetrievalResult {
    let contract_id = hit
        .contract_id()
        .or(requested)
        .unwrap_or_default()
        .to_string();
    let mut metadata = hit.metadata;
    metadata.insert("chunk_id".to_string(), hit.id.into());
    RetrievalResult::semantic(contract_id, hit.text, hit.relevance_score, metadata)
}

#[async_trait]
impl Retriever for HybridRetriever {
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<HybridRetrievalResponse, RetrievalError> {
        HybridRetriever::retrieve(self, query, options).await
    }
}
