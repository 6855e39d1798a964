//! Integration tests for the in-memory graph store.
//!
//! Covers: contract writers, traversal semantics (placeholders, filters,
//! ordering, limits, nesting) and snapshot loading.

use std::sync::Arc;

use lexgraph_graph::{
    ClauseInfo, CompanyRef, ContextOptions, Expansion, GraphContextRetriever, GraphError,
    GraphSnapshot, GraphStore, InMemoryGraphStore, NodeLabel, NodeSelector, Properties,
    RelationType, RiskFactor, RiskLevel, Traversal, company_node_id,
};
use serde_json::json;

fn clause(id: &str, clause_type: &str, content: &str) -> ClauseInfo {
    ClauseInfo {
        id: id.to_string(),
        section_name: format!("Section {id}"),
        clause_type: clause_type.to_string(),
        content: content.to_string(),
    }
}

fn risk(id: &str, level: RiskLevel) -> RiskFactor {
    RiskFactor {
        id: id.to_string(),
        concern: format!("concern {id}"),
        risk_level: level,
        section: String::new(),
        description: String::new(),
    }
}

fn metadata(value: serde_json::Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_link_party_reuses_company_node() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    store.add_contract("c2", Properties::new()).await.unwrap();
    let acme = CompanyRef {
        name: "Acme Corp".to_string(),
        role: "licensor".to_string(),
    };
    store.link_party("c1", &acme).await.unwrap();
    store.link_party("c2", &acme).await.unwrap();

    let stats = store.stats().await;
    assert_eq!(stats.nodes, 3);
    assert_eq!(stats.edges, 2);
    assert!(store.get_node(&company_node_id(" ACME corp ")).await.is_some());
}

#[tokio::test]
async fn test_writers_reject_unknown_contract() {
    let store = InMemoryGraphStore::new();
    let result = store.add_clause("missing", &clause("cl-1", "term", "x")).await;
    assert!(matches!(result, Err(GraphError::InvalidRelation(_, _))));

    let result = store.add_contract("  ", Properties::new()).await;
    assert!(matches!(result, Err(GraphError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_add_risk_with_dangling_clause_fails() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    let result = store
        .add_risk("c1", &risk("r1", RiskLevel::High), Some("nope"))
        .await;
    assert_eq!(
        result,
        Err(GraphError::InvalidRelation("r1".to_string(), "nope".to_string()))
    );
    assert_eq!(store.stats().await.nodes, 1);
    assert_eq!(store.stats().await.edges, 0);
    assert!(store.get_node("r1").await.is_none());

    let context = GraphContextRetriever::new(Arc::new(store))
        .get_context_for_contract("c1", &ContextOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert!(context.risk_factors.is_empty());
}

#[tokio::test]
async fn test_link_party_twice_keeps_one_edge() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    let acme = |role: &str| CompanyRef {
        name: "Acme Corp".to_string(),
        role: role.to_string(),
    };
    store.link_party("c1", &acme("licensor")).await.unwrap();
    store.link_party("c1", &acme("vendor")).await.unwrap();
    assert_eq!(store.stats().await.edges, 1);
    assert!(
        store
            .has_edge(&company_node_id("Acme Corp"), "c1", RelationType::PartyTo)
            .await
    );

    let context = GraphContextRetriever::new(Arc::new(store))
        .get_context_for_contract("c1", &ContextOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(context.companies, vec![acme("licensor")]);
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_traverse_missing_start_is_none() {
    let store = InMemoryGraphStore::new();
    let traversal = Traversal::from(NodeSelector::new(NodeLabel::Contract, "id", "nope"));
    assert_eq!(store.traverse(&traversal).await, Ok(None));
}

#[tokio::test]
async fn test_traverse_label_must_match() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    let traversal = Traversal::from(NodeSelector::new(NodeLabel::Company, "id", "c1"));
    assert_eq!(store.traverse(&traversal).await, Ok(None));
}

#[tokio::test]
async fn test_empty_expansion_yields_placeholder() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    let traversal = Traversal::from(NodeSelector::new(NodeLabel::Contract, "id", "c1"))
        .expand(Expansion::outgoing(RelationType::Contains));

    let row = store.traverse(&traversal).await.unwrap().unwrap();
    assert_eq!(row.expansions.len(), 1);
    assert_eq!(row.expansions[0], vec![None]);
    assert_eq!(row.expanded(0).count(), 0);
}

#[tokio::test]
async fn test_expansion_filter_and_limit() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    for (id, kind) in [("a", "term"), ("b", "payment"), ("c", "Term"), ("d", "term")] {
        store.add_clause("c1", &clause(id, kind, "text")).await.unwrap();
    }
    let traversal = Traversal::from(NodeSelector::new(NodeLabel::Contract, "id", "c1"))
        .expand(
            Expansion::outgoing(RelationType::Contains)
                .filter("clause_type", "term")
                .limit(2),
        );

    let row = store.traverse(&traversal).await.unwrap().unwrap();
    let ids: Vec<&str> = row.expanded(0).map(|n| n.node.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn test_expansion_order_by_descending_missing_last() {
    let store = InMemoryGraphStore::new();
    store.add_contract("old", metadata(json!({"upload_date": "2023-01-01"}))).await.unwrap();
    store.add_contract("undated", Properties::new()).await.unwrap();
    store.add_contract("new", metadata(json!({"upload_date": "2024-06-01"}))).await.unwrap();
    let acme = CompanyRef {
        name: "Acme".to_string(),
        role: String::new(),
    };
    for id in ["old", "undated", "new"] {
        store.link_party(id, &acme).await.unwrap();
    }

    let traversal = Traversal::from(NodeSelector::new(NodeLabel::Company, "name", "acme"))
        .expand(Expansion::outgoing(RelationType::PartyTo).order_by("upload_date", true));
    let row = store.traverse(&traversal).await.unwrap().unwrap();
    let ids: Vec<&str> = row.expanded(0).map(|n| n.node.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old", "undated"]);
}

#[tokio::test]
async fn test_nested_expansion_follows_affects() {
    let store = InMemoryGraphStore::new();
    store.add_contract("c1", Properties::new()).await.unwrap();
    store.add_clause("c1", &clause("cl-1", "termination", "Either party may terminate.")).await.unwrap();
    store.add_risk("c1", &risk("r1", RiskLevel::High), Some("cl-1")).await.unwrap();
    store.add_risk("c1", &risk("r2", RiskLevel::Low), None).await.unwrap();

    let traversal = Traversal::from(NodeSelector::new(NodeLabel::Contract, "id", "c1")).expand(
        Expansion::outgoing(RelationType::HasRisk)
            .then(Expansion::outgoing(RelationType::Affects).limit(1)),
    );
    let row = store.traverse(&traversal).await.unwrap().unwrap();
    let risks: Vec<_> = row.expanded(0).collect();
    assert_eq!(risks.len(), 2);
    assert_eq!(
        risks[0].expanded(0).map(|n| n.node.id.as_str()).collect::<Vec<_>>(),
        vec!["cl-1"]
    );
    assert_eq!(risks[1].expansions[0], vec![None]);
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

const SNAPSHOT: &str = r#"{
  "contracts": [{
    "id": "c1",
    "metadata": {"filename": "msa.pdf", "upload_date": "2024-03-01"},
    "parties": [{"name": "Acme Corp", "role": "licensor"}],
    "clauses": [
      {"id": "c1-term", "section_name": "12. Termination", "clause_type": "termination",
       "content": "Either party may terminate on 30 days notice."},
      {"section_name": "4. Fees", "clause_type": "payment", "content": "Net 30."}
    ],
    "risks": [{"concern": "Short notice", "risk_level": "high", "clause_id": "c1-term"}]
  }]
}"#;

#[tokio::test]
async fn test_snapshot_loads_graph() {
    let snapshot = GraphSnapshot::from_json(SNAPSHOT).unwrap();
    let store = snapshot.into_store().await.unwrap();

    let stats = store.stats().await;
    // contract + company + 2 clauses + 1 risk
    assert_eq!(stats.nodes, 5);
    // PARTY_TO + 2 CONTAINS + HAS_RISK + AFFECTS
    assert_eq!(stats.edges, 5);
    assert!(store.get_node("c1#clause-2").await.is_some());
    assert!(store.get_node("c1#risk-1").await.is_some());
}

#[tokio::test]
async fn test_snapshot_links_risk_by_section_name() {
    let snapshot = GraphSnapshot::from_json(
        r#"{"contracts": [{
          "id": "c1",
          "clauses": [
            {"id": "c1-term", "section_name": "12. Termination", "clause_type": "termination",
             "content": "Thirty days notice."},
            {"id": "c1-fees", "section_name": "4. Fees", "clause_type": "payment",
             "content": "Net 30."}
          ],
          "risks": [
            {"id": "r-term", "concern": "Short notice", "section": "12. Termination"},
            {"id": "r-case", "concern": "Late fees", "section": "4. fees"},
            {"id": "r-none", "concern": "No governing law"}
          ]
        }]}"#,
    )
    .unwrap();
    let store = snapshot.into_store().await.unwrap();

    assert!(store.has_edge("r-term", "c1-term", RelationType::Affects).await);
    assert!(!store.has_edge("r-case", "c1-fees", RelationType::Affects).await);
    // 2 CONTAINS + 3 HAS_RISK + 1 AFFECTS
    assert_eq!(store.stats().await.edges, 6);
}

#[tokio::test]
async fn test_snapshot_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(&path, SNAPSHOT).unwrap();
    let snapshot = GraphSnapshot::from_path(&path).unwrap();
    assert_eq!(snapshot.contracts.len(), 1);

    let missing = GraphSnapshot::from_path(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(GraphError::Snapshot(_))));
}

#[test]
fn test_snapshot_rejects_malformed_json() {
    assert!(matches!(
        GraphSnapshot::from_json("{not json"),
        Err(GraphError::Snapshot(_))
    ));
}
