//! Integration tests for `HybridRetriever`.
//!
//! Covers: RRF ordering on a concrete scenario, contract discovery, fan-out
//! completeness and degradation, bounded concurrency, timeouts and error
//! propagation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lexgraph_graph::{
    CompanyRef, GraphContextRetriever, GraphError, GraphStore, InMemoryGraphStore, Properties,
    RiskFactor, RiskLevel, Traversal, TraversalRow,
};
use lexgraph_retrieval::{
    BackingStore, HybridRetriever, HybridRetrieverConfig, RetrievalError, RetrievalSource,
    RetrieveOptions, SemanticHit, VectorSearchClient, VectorSearchError, estimate_tokens, rrf_term,
};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Vector client returning fixed hits and recording calls.
#[derive(Default)]
struct StaticVector {
    hits: Vec<SemanticHit>,
    fail: Option<VectorSearchError>,
    calls: Mutex<Vec<(String, Option<String>, usize)>>,
}

impl StaticVector {
    fn with_hits(hits: Vec<SemanticHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, Option<String>, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorSearchClient for StaticVector {
    async fn semantic_search(
        &self,
        query: &str,
        contract_id: Option<&str>,
        n_results: usize,
    ) -> Result<Vec<SemanticHit>, VectorSearchError> {
        self.calls.lock().unwrap().push((
            query.to_string(),
            contract_id.map(str::to_string),
            n_results,
        ));
        if let Some(error) = &self.fail {
            return Err(error.clone());
        }
        Ok(self.hits.iter().take(n_results).cloned().collect())
    }
}

/// Graph store wrapper that counts traversals and injects per-contract behavior.
#[derive(Default)]
struct ScriptedGraph {
    inner: InMemoryGraphStore,
    query_errors: HashSet<String>,
    unavailable: HashSet<String>,
    slow: HashSet<String>,
    panics: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl GraphStore for ScriptedGraph {
    async fn traverse(&self, traversal: &Traversal) -> Result<Option<TraversalRow>, GraphError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let id = traversal.start.value.as_str().unwrap_or_default().to_string();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.slow.contains(&id) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        assert!(!self.panics.contains(&id), "scripted panic for {id}");
        if self.unavailable.contains(&id) {
            return Err(GraphError::Unavailable("connection refused".to_string()));
        }
        if self.query_errors.contains(&id) {
            return Err(GraphError::Query("syntax error".to_string()));
        }
        self.inner.traverse(traversal).await
    }
}

fn hit(id: &str, contract_id: &str, text: &str, score: f32) -> SemanticHit {
    let mut metadata = Map::new();
    metadata.insert("contract_id".to_string(), Value::from(contract_id));
    SemanticHit {
        id: id.to_string(),
        text: text.to_string(),
        metadata,
        relevance_score: score,
    }
}

async fn contract_with_party(store: &InMemoryGraphStore, contract_id: &str, company: &str) {
    store
        .add_contract(contract_id, Properties::new())
        .await
        .unwrap();
    store
        .link_party(
            contract_id,
            &CompanyRef {
                name: company.to_string(),
                role: "party".to_string(),
            },
        )
        .await
        .unwrap();
}

fn retriever(
    vector: Arc<StaticVector>,
    graph: Arc<ScriptedGraph>,
    config: HybridRetrieverConfig,
) -> HybridRetriever {
    HybridRetriever::new(vector, GraphContextRetriever::new(graph), config)
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_concrete_scenario_ranks_with_insertion_tiebreak() {
    let graph = ScriptedGraph::default();
    contract_with_party(&graph.inner, "c1", "Acme Corp").await;
    graph
        .inner
        .add_risk(
            "c1",
            &RiskFactor {
                id: "c1-r1".to_string(),
                concern: "Uncapped liability".to_string(),
                risk_level: RiskLevel::High,
                section: String::new(),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap();
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("s1", "c1", "Liability is unlimited.", 0.9),
        hit("s2", "c1", "Payment is due in 30 days.", 0.7),
    ]));

    let response = retriever(vector, Arc::new(graph), HybridRetrieverConfig::default())
        .retrieve("liability", &RetrieveOptions::default())
        .await
        .unwrap();

    assert_eq!(response.semantic_count, 2);
    assert_eq!(response.graph_count, 2);
    assert_eq!(response.results.len(), 4);

    let top = &response.results[0];
    let second = &response.results[1];
    assert_eq!(top.source, RetrievalSource::Semantic);
    assert_eq!(top.content, "Liability is unlimited.");
    assert_eq!(second.source, RetrievalSource::Graph);
    assert_eq!(second.item_type(), Some("risk"));
    assert!((top.rrf_score() - rrf_term(60.0, 0)).abs() < 1e-6);
    assert!((top.rrf_score() - second.rrf_score()).abs() < f32::EPSILON);
    assert!((top.rrf_score() - 1.0 / 61.0).abs() < 1e-6);

    let tail: Vec<(RetrievalSource, f32)> = response.results[2..]
        .iter()
        .map(|r| (r.source, r.rrf_score()))
        .collect();
    assert_eq!(tail[0].0, RetrievalSource::Semantic);
    assert_eq!(tail[1].0, RetrievalSource::Graph);
    assert!((tail[0].1 - 1.0 / 62.0).abs() < 1e-6);

    assert_eq!(
        response.total_tokens_estimate,
        estimate_tokens(&response.results)
    );
}

#[tokio::test]
async fn test_results_sorted_descending() {
    let graph = ScriptedGraph::default();
    for id in ["a", "b", "c"] {
        contract_with_party(&graph.inner, id, &format!("Company {id}")).await;
    }
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("1", "a", "one", 0.3),
        hit("2", "b", "two", 0.8),
        hit("3", "c", "three", 0.5),
    ]));
    let response = retriever(vector, Arc::new(graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();
    assert!(
        response
            .results
            .windows(2)
            .all(|pair| pair[0].rrf_score() >= pair[1].rrf_score())
    );
    assert_eq!(response.results[0].content, "two");
}

#[tokio::test]
async fn test_custom_rrf_k_is_per_instance() {
    let graph = Arc::new(ScriptedGraph::default());
    let vector = Arc::new(StaticVector::with_hits(vec![hit("1", "x", "only", 0.5)]));
    let config = HybridRetrieverConfig::default().with_rrf_k(10.0);
    let response = retriever(vector, graph, config)
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();
    assert!((response.results[0].rrf_score() - 1.0 / 11.0).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Discovery and empty inputs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_semantic_without_contract_skips_fanout() {
    let graph = Arc::new(ScriptedGraph::default());
    let vector = Arc::new(StaticVector::default());
    let response = retriever(vector, Arc::clone(&graph), HybridRetrieverConfig::default())
        .retrieve("anything", &RetrieveOptions::default())
        .await
        .unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.semantic_count, 0);
    assert_eq!(response.graph_count, 0);
    assert_eq!(response.total_tokens_estimate, 0);
    assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_requested_contract_gets_graph_only_coverage() {
    let graph = ScriptedGraph::default();
    contract_with_party(&graph.inner, "c7", "Initech").await;
    let graph = Arc::new(graph);
    let vector = Arc::new(StaticVector::default());

    let response = retriever(
        Arc::clone(&vector),
        Arc::clone(&graph),
        HybridRetrieverConfig::default(),
    )
    .retrieve("who are the parties", &RetrieveOptions::default().for_contract(" c7 "))
    .await
    .unwrap();

    assert_eq!(response.semantic_count, 0);
    assert_eq!(response.graph_count, 1);
    assert_eq!(response.results[0].contract_id, "c7");
    assert_eq!(
        vector.calls(),
        vec![("who are the parties".to_string(), Some("c7".to_string()), 5)]
    );
}

#[tokio::test]
async fn test_requested_contract_id_is_case_sensitive() {
    let graph = ScriptedGraph::default();
    contract_with_party(&graph.inner, "c7", "Initech").await;
    let response = retriever(
        Arc::new(StaticVector::default()),
        Arc::new(graph),
        HybridRetrieverConfig::default(),
    )
    .retrieve("who are the parties", &RetrieveOptions::default().for_contract("C7"))
    .await
    .unwrap();

    assert_eq!(response.graph_count, 0);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_missing_contract_contributes_nothing() {
    let graph = Arc::new(ScriptedGraph::default());
    let vector = Arc::new(StaticVector::with_hits(vec![hit("1", "ghost", "text", 0.4)]));
    let response = retriever(vector, Arc::clone(&graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();
    assert_eq!(response.semantic_count, 1);
    assert_eq!(response.graph_count, 0);
    assert_eq!(graph.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blank_contract_id_is_rejected_before_io() {
    let vector = Arc::new(StaticVector::default());
    let result = retriever(
        Arc::clone(&vector),
        Arc::new(ScriptedGraph::default()),
        HybridRetrieverConfig::default(),
    )
    .retrieve("q", &RetrieveOptions::default().for_contract("   "))
    .await;
    assert!(matches!(result, Err(RetrievalError::InvalidArgument(_))));
    assert!(vector.calls().is_empty());
}

#[tokio::test]
async fn test_include_flags_drop_companies_and_risks() {
    let graph = ScriptedGraph::default();
    contract_with_party(&graph.inner, "c1", "Acme").await;
    graph
        .inner
        .add_risk(
            "c1",
            &RiskFactor {
                id: "r".to_string(),
                concern: "risk".to_string(),
                risk_level: RiskLevel::Low,
                section: String::new(),
                description: String::new(),
            },
            None,
        )
        .await
        .unwrap();
    let vector = Arc::new(StaticVector::default());
    let options = RetrieveOptions {
        include_companies: false,
        include_risks: false,
        ..RetrieveOptions::default().for_contract("c1")
    };
    let response = retriever(vector, Arc::new(graph), HybridRetrieverConfig::default())
        .retrieve("q", &options)
        .await
        .unwrap();
    assert_eq!(response.graph_count, 0);
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fanout_is_complete_and_isolates_failures() {
    let mut graph = ScriptedGraph::default();
    for id in ["c1", "c2", "c3"] {
        contract_with_party(&graph.inner, id, &format!("Company {id}")).await;
    }
    graph.query_errors.insert("c2".to_string());
    let graph = Arc::new(graph);
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("1", "c1", "one", 0.9),
        hit("2", "c2", "two", 0.8),
        hit("3", "c3", "three", 0.7),
        hit("4", "c1", "four", 0.6),
    ]));

    let response = retriever(vector, Arc::clone(&graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();

    assert_eq!(graph.calls.load(Ordering::SeqCst), 3);
    let graph_contracts: HashSet<&str> = response
        .results
        .iter()
        .filter(|r| r.source == RetrievalSource::Graph)
        .map(|r| r.contract_id.as_str())
        .collect();
    assert_eq!(graph_contracts, HashSet::from(["c1", "c3"]));
    assert_eq!(response.semantic_count, 4);
}

#[tokio::test]
async fn test_graph_items_follow_discovery_order() {
    let mut graph = ScriptedGraph::default();
    for id in ["late", "early"] {
        contract_with_party(&graph.inner, id, &format!("Company {id}")).await;
    }
    graph.delay = Some(Duration::from_millis(5));
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("1", "early", "e", 0.9),
        hit("2", "late", "l", 0.8),
    ]));
    let response = retriever(vector, Arc::new(graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();
    let graph_order: Vec<&str> = response
        .results
        .iter()
        .filter(|r| r.source == RetrievalSource::Graph)
        .map(|r| r.contract_id.as_str())
        .collect();
    // equal weights tie, so merge order (discovery order) decides
    assert_eq!(graph_order, vec!["early", "late"]);
}

#[tokio::test]
async fn test_fanout_respects_permit_count() {
    let mut graph = ScriptedGraph::default();
    let mut hits = Vec::new();
    for i in 0..6 {
        let id = format!("c{i}");
        contract_with_party(&graph.inner, &id, &format!("Company {i}")).await;
        hits.push(hit(&format!("h{i}"), &id, "text", 0.5));
    }
    graph.delay = Some(Duration::from_millis(20));
    let graph = Arc::new(graph);
    let vector = Arc::new(StaticVector::with_hits(hits));
    let config = HybridRetrieverConfig::default().with_max_concurrent_graph_fetches(2);

    let response = retriever(vector, Arc::clone(&graph), config)
        .retrieve("q", &RetrieveOptions::default().with_limits(6, 3))
        .await
        .unwrap();

    assert_eq!(graph.calls.load(Ordering::SeqCst), 6);
    assert!(graph.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(response.graph_count, 6);
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_times_out_and_degrades() {
    let mut graph = ScriptedGraph::default();
    for id in ["fast", "slow"] {
        contract_with_party(&graph.inner, id, &format!("Company {id}")).await;
    }
    graph.slow.insert("slow".to_string());
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("1", "fast", "f", 0.9),
        hit("2", "slow", "s", 0.8),
    ]));
    let config =
        HybridRetrieverConfig::default().with_graph_fetch_timeout(Duration::from_millis(100));

    let response = retriever(vector, Arc::new(graph), config)
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();
    assert_eq!(response.graph_count, 1);
    assert!(
        response
            .results
            .iter()
            .filter(|r| r.source == RetrievalSource::Graph)
            .all(|r| r.contract_id == "fast")
    );
}

#[tokio::test]
async fn test_panicking_fetch_degrades() {
    let mut graph = ScriptedGraph::default();
    for id in ["ok", "boom"] {
        contract_with_party(&graph.inner, id, &format!("Company {id}")).await;
    }
    graph.panics.insert("boom".to_string());
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("1", "ok", "fine", 0.9),
        hit("2", "boom", "bad", 0.8),
    ]));
    let response = retriever(vector, Arc::new(graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap();
    assert_eq!(response.graph_count, 1);
}

// ---------------------------------------------------------------------------
// Unavailable stores
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_graph_unavailable_propagates() {
    let mut graph = ScriptedGraph::default();
    for id in ["c1", "c2"] {
        contract_with_party(&graph.inner, id, &format!("Company {id}")).await;
    }
    graph.unavailable.insert("c2".to_string());
    let vector = Arc::new(StaticVector::with_hits(vec![
        hit("1", "c1", "one", 0.9),
        hit("2", "c2", "two", 0.8),
    ]));
    let error = retriever(vector, Arc::new(graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default())
        .await
        .unwrap_err();
    assert!(error.is_unavailable());
    assert!(matches!(
        error,
        RetrievalError::BackingStoreUnavailable {
            store: BackingStore::Graph,
            ..
        }
    ));
}

#[tokio::test]
async fn test_vector_unavailable_propagates() {
    let vector = Arc::new(StaticVector {
        fail: Some(VectorSearchError::Unavailable("timeout".to_string())),
        ..StaticVector::default()
    });
    let graph = Arc::new(ScriptedGraph::default());
    let error = retriever(vector, Arc::clone(&graph), HybridRetrieverConfig::default())
        .retrieve("q", &RetrieveOptions::default().for_contract("c1"))
        .await
        .unwrap_err();
    assert_eq!(
        error,
        RetrievalError::BackingStoreUnavailable {
            store: BackingStore::Vector,
            message: "timeout".to_string()
        }
    );
    assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
}
