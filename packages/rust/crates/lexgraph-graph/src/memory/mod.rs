//! In-memory property graph store.
//!
//! Modular design:
//! - `mod.rs`: `InMemoryGraphStore` struct, node/edge CRUD, accessors
//! - `traverse.rs`: `GraphStore` implementation (traversal execution)
//! - `contracts.rs`: contract-domain helpers (contracts, parties, clauses, risks)

mod contracts;
mod traverse;

pub use contracts::company_node_id;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::GraphError;
use crate::model::{GraphEdge, GraphNode, RelationType};

/// Reference graph store backed by hash maps.
///
/// Cheap to clone; clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    state: Arc<RwLock<GraphState>>,
}

#[derive(Debug, Default)]
pub(crate) struct GraphState {
    /// Nodes by id
    pub(crate) nodes: HashMap<String, GraphNode>,
    /// Node ids in insertion order (deterministic start-node scans)
    pub(crate) node_order: Vec<String>,
    /// Edges in insertion order
    pub(crate) edges: Vec<GraphEdge>,
    /// Outgoing edge indices by source node id
    pub(crate) outgoing: HashMap<String, Vec<usize>>,
    /// Incoming edge indices by target node id
    pub(crate) incoming: HashMap<String, Vec<usize>>,
}

/// Node and edge counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStoreStats {
    /// Number of nodes.
    pub nodes: usize,
    /// Number of edges.
    pub edges: usize,
}

impl InMemoryGraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns true if newly added, false if an existing node was replaced.
    pub async fn add_node(&self, node: GraphNode) -> bool {
        let mut state = self.state.write().await;
        let id = node.id.clone();
        if let Some(existing) = state.nodes.get_mut(&id) {
            *existing = node;
            debug!(node_id = %id, "replaced graph node");
            return false;
        }
        state.nodes.insert(id.clone(), node);
        state.node_order.push(id);
        true
    }

    /// Add an edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidRelation`] when either endpoint is unknown.
    pub async fn add_edge(&self, edge: GraphEdge) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(&edge.source) || !state.nodes.contains_key(&edge.target) {
            return Err(GraphError::InvalidRelation(
                edge.source.clone(),
                edge.target.clone(),
            ));
        }
        let index = state.edges.len();
        state
            .outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(index);
        state
            .incoming
            .entry(edge.target.clone())
            .or_default()
            .push(index);
        debug!(
            source = %edge.source,
            target = %edge.target,
            relation = %edge.relation,
            "added graph edge"
        );
        state.edges.push(edge);
        Ok(())
    }

    /// Get a node by id.
    pub async fn get_node(&self, id: &str) -> Option<GraphNode> {
        self.state.read().await.nodes.get(id).cloned()
    }

    /// True when an edge `source -relation-> target` exists.
    pub async fn has_edge(&self, source: &str, target: &str, relation: RelationType) -> bool {
        let state = self.state.read().await;
        state
            .outgoing
            .get(source)
            .into_iter()
            .flatten()
            .filter_map(|&index| state.edges.get(index))
            .any(|edge| edge.target == target && edge.relation == relation)
    }

    /// Node and edge counts.
    pub async fn stats(&self) -> GraphStoreStats {
        let state = self.state.read().await;
        GraphStoreStats {
            nodes: state.nodes.len(),
            edges: state.edges.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryGraphStore;
    use crate::error::GraphError;
    use crate::model::{GraphEdge, GraphNode, NodeLabel, RelationType};

    #[tokio::test]
    async fn test_add_node_replaces_existing() {
        let store = InMemoryGraphStore::new();
        assert!(store.add_node(GraphNode::new("c1", NodeLabel::Contract)).await);
        assert!(
            !store
                .add_node(GraphNode::new("c1", NodeLabel::Contract).with_property("filename", "a.pdf"))
                .await
        );
        let stats = store.stats().await;
        assert_eq!(stats.nodes, 1);
        let node = store.get_node("c1").await;
        assert_eq!(node.and_then(|n| n.str_property("filename").map(str::to_string)), Some("a.pdf".to_string()));
    }

    #[tokio::test]
    async fn test_add_edge_rejects_unknown_endpoint() {
        let store = InMemoryGraphStore::new();
        store.add_node(GraphNode::new("c1", NodeLabel::Contract)).await;
        let result = store
            .add_edge(GraphEdge::new("c1", "clause-x", RelationType::Contains))
            .await;
        assert_eq!(
            result,
            Err(GraphError::InvalidRelation("c1".to_string(), "clause-x".to_string()))
        );
        assert_eq!(store.stats().await.edges, 0);
    }
}
