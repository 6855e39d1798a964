//! Traversal execution for the in-memory store.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use super::{GraphState, InMemoryGraphStore};
use crate::error::GraphError;
use crate::model::{Direction, GraphEdge, GraphNode};
use crate::store::GraphStore;
use crate::traversal::{Expansion, Neighbor, NodeSelector, OrderBy, Traversal, TraversalRow};

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn traverse(&self, traversal: &Traversal) -> Result<Option<TraversalRow>, GraphError> {
        let state = self.state.read().await;
        let Some(start) = state.find_start(&traversal.start) else {
            return Ok(None);
        };
        let expansions = traversal
            .expansions
            .iter()
            .map(|expansion| state.expand(&start.id, expansion))
            .collect();
        Ok(Some(TraversalRow {
            node: start.clone(),
            expansions,
        }))
    }
}

impl GraphState {
    /// Ids match exactly; other keys go through [`values_match`].
    fn find_start(&self, selector: &NodeSelector) -> Option<&GraphNode> {
        if selector.key == "id" {
            return selector
                .value
                .as_str()
                .and_then(|id| self.nodes.get(id))
                .filter(|node| node.label == selector.label);
        }
        self.node_order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| {
                node.label == selector.label
                    && values_match(node.properties.get(&selector.key), &selector.value)
            })
    }

    fn expand(&self, node_id: &str, expansion: &Expansion) -> Vec<Option<Neighbor>> {
        let index = match expansion.direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        let mut hits: Vec<(&GraphEdge, &GraphNode)> = index
            .get(node_id)
            .into_iter()
            .flatten()
            .filter_map(|&edge_index| self.edges.get(edge_index))
            .filter(|edge| edge.relation == expansion.relation)
            .filter_map(|edge| {
                let other = match expansion.direction {
                    Direction::Outgoing => &edge.target,
                    Direction::Incoming => &edge.source,
                };
                self.nodes.get(other).map(|node| (edge, node))
            })
            .filter(|(_, node)| {
                expansion
                    .filters
                    .iter()
                    .all(|filter| values_match(node.properties.get(&filter.key), &filter.value))
            })
            .collect();

        if let Some(order) = &expansion.order_by {
            hits.sort_by(|a, b| compare_for_order(a.1, b.1, order));
        }
        if let Some(limit) = expansion.limit {
            hits.truncate(limit);
        }
        if hits.is_empty() {
            return vec![None];
        }

        hits.into_iter()
            .map(|(edge, node)| {
                Some(Neighbor {
                    node: node.clone(),
                    edge: edge.clone(),
                    expansions: expansion
                        .then
                        .iter()
                        .map(|nested| self.expand(&node.id, nested))
                        .collect(),
                })
            })
            .collect()
    }
}

/// Equality with case-insensitive, trimmed string comparison.
fn values_match(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (Some(Value::String(a)), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (Some(a), b) => a == b,
        (None, _) => false,
    }
}

enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_key(value: Option<&Value>) -> Option<SortKey<'_>> {
    match value? {
        Value::Number(n) => n.as_f64().map(SortKey::Number),
        Value::String(s) => Some(SortKey::Text(s.as_str())),
        _ => None,
    }
}

/// Missing or unsortable values go last in both directions.
fn compare_for_order(a: &GraphNode, b: &GraphNode, order: &OrderBy) -> Ordering {
    let a_key = sort_key(a.properties.get(&order.key));
    let b_key = sort_key(b.properties.get(&order.key));
    let ordering = match (a_key, b_key) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(SortKey::Number(x)), Some(SortKey::Number(y))) => x.total_cmp(&y),
        (Some(SortKey::Text(x)), Some(SortKey::Text(y))) => x.cmp(&y),
        (Some(SortKey::Number(_)), Some(SortKey::Text(_))) => Ordering::Less,
        (Some(SortKey::Text(_)), Some(SortKey::Number(_))) => Ordering::Greater,
    };
    if order.descending {
        ordering.reverse()
    } else {
        ordering
    }
}
