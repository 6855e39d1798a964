//! Read-only traversal description and result rows.
//!
//! A [`Traversal`] selects one start node and expands any number of one-hop
//! relationships from it; each expansion may nest further expansions. Stores
//! execute the description in one round trip. An expansion that matches no
//! neighbor yields a single `None` placeholder (optional-match semantics), so
//! callers can tell "expanded, nothing there" apart from "not requested".

use serde_json::Value;

use crate::model::{Direction, GraphEdge, GraphNode, NodeLabel, RelationType};

/// Start node selection by label and property equality.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSelector {
    /// Label the start node must carry.
    pub label: NodeLabel,
    /// Property name matched for equality.
    pub key: String,
    /// Expected property value.
    pub value: Value,
}

impl NodeSelector {
    /// Select by label and property equality.
    #[must_use]
    pub fn new(label: NodeLabel, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Property equality filter applied to neighbor nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    /// Property name.
    pub key: String,
    /// Expected value. String comparison is case-insensitive.
    pub value: Value,
}

/// Neighbor ordering by a node property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Property name.
    pub key: String,
    /// Sort descending when true. Missing values always sort last.
    pub descending: bool,
}

/// One-hop expansion from the node being expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Relationship type followed.
    pub relation: RelationType,
    /// Direction followed.
    pub direction: Direction,
    /// Equality filters on neighbor properties (all must match).
    pub filters: Vec<PropertyFilter>,
    /// Optional neighbor ordering applied before `limit`.
    pub order_by: Option<OrderBy>,
    /// Maximum neighbors returned.
    pub limit: Option<usize>,
    /// Nested expansions run from each neighbor.
    pub then: Vec<Expansion>,
}

impl Expansion {
    /// Follow outgoing `relation` edges.
    #[must_use]
    pub fn outgoing(relation: RelationType) -> Self {
        Self::new(relation, Direction::Outgoing)
    }

    /// Follow incoming `relation` edges.
    #[must_use]
    pub fn incoming(relation: RelationType) -> Self {
        Self::new(relation, Direction::Incoming)
    }

    fn new(relation: RelationType, direction: Direction) -> Self {
        Self {
            relation,
            direction,
            filters: Vec::new(),
            order_by: None,
            limit: None,
            then: Vec::new(),
        }
    }

    /// Keep neighbors whose `key` property equals `value`.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(PropertyFilter {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Order neighbors by `key`.
    #[must_use]
    pub fn order_by(mut self, key: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            key: key.into(),
            descending,
        });
        self
    }

    /// Cap the neighbor count.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add a nested expansion.
    #[must_use]
    pub fn then(mut self, expansion: Expansion) -> Self {
        self.then.push(expansion);
        self
    }
}

/// Full traversal: start node plus expansions.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    /// Start node selector.
    pub start: NodeSelector,
    /// Expansions from the start node; result slots follow this order.
    pub expansions: Vec<Expansion>,
}

impl Traversal {
    /// Start a traversal at the node matched by `start`.
    #[must_use]
    pub fn from(start: NodeSelector) -> Self {
        Self {
            start,
            expansions: Vec::new(),
        }
    }

    /// Add an expansion from the start node.
    #[must_use]
    pub fn expand(mut self, expansion: Expansion) -> Self {
        self.expansions.push(expansion);
        self
    }
}

/// A neighbor reached by an expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Neighbor node.
    pub node: GraphNode,
    /// Edge that was followed.
    pub edge: GraphEdge,
    /// Results of nested expansions, one slot per `Expansion::then` entry.
    pub expansions: Vec<Vec<Option<Neighbor>>>,
}

impl Neighbor {
    /// Non-placeholder neighbors of nested expansion `slot`.
    pub fn expanded(&self, slot: usize) -> impl Iterator<Item = &Neighbor> {
        present(self.expansions.get(slot))
    }
}

/// Result of a traversal whose start node matched.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalRow {
    /// Start node.
    pub node: GraphNode,
    /// One slot per top-level expansion, in request order.
    pub expansions: Vec<Vec<Option<Neighbor>>>,
}

impl TraversalRow {
    /// Non-placeholder neighbors of top-level expansion `slot`.
    pub fn expanded(&self, slot: usize) -> impl Iterator<Item = &Neighbor> {
        present(self.expansions.get(slot))
    }
}

fn present(slot: Option<&Vec<Option<Neighbor>>>) -> impl Iterator<Item = &Neighbor> {
    slot.into_iter().flatten().filter_map(Option::as_ref)
}
