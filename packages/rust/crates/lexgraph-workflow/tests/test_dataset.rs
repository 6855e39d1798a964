//! Integration tests for dataset loading and formatting over the sample corpus.

use std::path::PathBuf;

use lexgraph_graph::{GraphError, RiskLevel};
use lexgraph_retrieval::{
    HybridRetrieverConfig, RetrievalContext, RetrievalSource, RetrieveOptions, Retriever,
};
use lexgraph_workflow::{Dataset, DatasetError, extract_sources, format_context};

fn sample_dataset_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../data/sample_contracts.json")
}

async fn sample_context() -> RetrievalContext {
    let loaded = Dataset::from_path(&sample_dataset_path())
        .unwrap()
        .load()
        .await
        .unwrap();
    RetrievalContext::new(loaded.vector, loaded.graph, HybridRetrieverConfig::default())
}

#[tokio::test]
async fn test_sample_dataset_loads_graph_and_chunks() {
    let dataset = Dataset::from_path(&sample_dataset_path()).unwrap();
    assert_eq!(dataset.graph.contracts.len(), 3);
    assert_eq!(dataset.chunks.len(), 5);

    let loaded = dataset.load().await.unwrap();
    assert_eq!(loaded.vector.len().await, 5);
    // 3 contracts, 4 companies, 7 clauses, 4 risks
    assert_eq!(loaded.graph.stats().await.nodes, 18);
}

#[tokio::test]
async fn test_similar_contracts_most_recent_first() {
    let context = sample_context().await;
    let similar = context
        .graph_retriever()
        .find_similar_contracts_by_company("Acme Corp", 5)
        .await
        .unwrap();
    let ids: Vec<&str> = similar.iter().map(|c| c.contract_id.as_str()).collect();
    assert_eq!(ids, vec!["nda-acme-2024", "msa-acme-2023"]);
    assert_eq!(similar[0].role, "discloser");
    assert_eq!(similar[1].risk_level, RiskLevel::High);
}

#[tokio::test]
async fn test_risk_context_joins_affected_clause() {
    let context = sample_context().await;
    let risks = context
        .graph_retriever()
        .get_risk_context("msa-acme-2023", Some(RiskLevel::High))
        .await
        .unwrap();
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].risk.concern, "Uncapped customer indemnity");
    assert!(risks[0]
        .clause_content
        .as_deref()
        .is_some_and(|c| c.contains("indemnify")));

    let clause = context
        .graph_retriever()
        .get_context_for_clause_type("msa-acme-2023", "termination")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(clause.clause.section_name, "12. Termination");
    assert_eq!(clause.related_risks.len(), 1);
    assert_eq!(clause.related_risks[0].risk_level, RiskLevel::Medium);
}

#[tokio::test]
async fn test_scoped_retrieval_formats_cited_context() {
    let context = sample_context().await;
    let response = context
        .retriever()
        .retrieve(
            "early termination fee",
            &RetrieveOptions::default().for_contract("lease-umbrella-2022"),
        )
        .await
        .unwrap();
    assert!(
        response
            .results
            .iter()
            .all(|r| r.contract_id == "lease-umbrella-2022")
    );
    assert!(response.semantic_count >= 1);

    let text = format_context(&response.results);
    let sources = extract_sources(&response.results);
    assert_eq!(sources.len(), response.results.len());
    for source in &sources {
        let header = match source.source_type {
            RetrievalSource::Semantic => format!("[{}] Document (contract lease-umbrella-2022)", source.index),
            RetrievalSource::Graph => format!(
                "[{}] Knowledge Graph (contract lease-umbrella-2022, {})",
                source.index,
                source.item_type.as_deref().unwrap_or_default()
            ),
        };
        assert!(text.contains(&header), "missing header {header}");
    }
}

#[test]
fn test_malformed_and_missing_files() {
    assert!(matches!(
        Dataset::from_json("{\"contracts\": 3}"),
        Err(DatasetError::Parse(_))
    ));
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Dataset::from_path(&dir.path().join("absent.json")),
        Err(DatasetError::Io { .. })
    ));
}

#[tokio::test]
async fn test_dangling_clause_reference_fails_load() {
    let dataset = Dataset::from_json(
        r#"{"contracts": [{"id": "c1",
             "risks": [{"concern": "x", "risk_level": "low", "clause_id": "nope"}]}],
            "chunks": []}"#,
    )
    .unwrap();
    let error = dataset.load().await.unwrap_err();
    assert!(matches!(
        error,
        DatasetError::Graph(GraphError::InvalidRelation(_, _))
    ));
}
