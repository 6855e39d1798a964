//! Node and relationship types of the contract property graph.
//!
//! Schema:
//!
//! ```text
//! (Company)-[:PARTY_TO {role}]->(Contract)
//! (Contract)-[:CONTAINS]->(Clause)
//! (Contract)-[:HAS_RISK]->(RiskFactor)
//! (RiskFactor)-[:AFFECTS]->(Clause)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property map attached to nodes and edges.
pub type Properties = Map<String, Value>;

/// Node label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    /// A legal contract document.
    #[serde(rename = "Contract")]
    Contract,
    /// A company that is party to contracts.
    #[serde(rename = "Company")]
    Company,
    /// A clause extracted from a contract.
    #[serde(rename = "Clause")]
    Clause,
    /// A risk factor identified in a contract.
    #[serde(rename = "RiskFactor")]
    RiskFactor,
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeLabel::Contract => write!(f, "Contract"),
            NodeLabel::Company => write!(f, "Company"),
            NodeLabel::Clause => write!(f, "Clause"),
            NodeLabel::RiskFactor => write!(f, "RiskFactor"),
        }
    }
}

/// Relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    /// Company is a party to a contract (edge property `role`).
    #[serde(rename = "PARTY_TO")]
    PartyTo,
    /// Contract contains a clause.
    #[serde(rename = "CONTAINS")]
    Contains,
    /// Contract carries a risk factor.
    #[serde(rename = "HAS_RISK")]
    HasRisk,
    /// Risk factor concerns a specific clause.
    #[serde(rename = "AFFECTS")]
    Affects,
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationType::PartyTo => write!(f, "PARTY_TO"),
            RelationType::Contains => write!(f, "CONTAINS"),
            RelationType::HasRisk => write!(f, "HAS_RISK"),
            RelationType::Affects => write!(f, "AFFECTS"),
        }
    }
}

/// Edge direction relative to the node being expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `(node)-[rel]->(neighbor)`
    Outgoing,
    /// `(node)<-[rel]-(neighbor)`
    Incoming,
}

/// A node as returned by a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Store-unique node id.
    pub id: String,
    /// Node label.
    pub label: NodeLabel,
    /// Node properties.
    #[serde(default)]
    pub properties: Properties,
}

impl GraphNode {
    /// Create a node with empty properties.
    #[must_use]
    pub fn new(id: impl Into<String>, label: NodeLabel) -> Self {
        Self {
            id: id.into(),
            label,
            properties: Properties::new(),
        }
    }

    /// Builder: set a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// String property, `None` when missing, null, non-string or blank.
    #[must_use]
    pub fn str_property(&self, key: &str) -> Option<&str> {
        str_property(&self.properties, key)
    }
}

/// A relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relationship type.
    pub relation: RelationType,
    /// Edge properties.
    #[serde(default)]
    pub properties: Properties,
}

impl GraphEdge {
    /// Create an edge with empty properties.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, relation: RelationType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
            properties: Properties::new(),
        }
    }

    /// Builder: set a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Read a non-blank string property from a property map.
#[must_use]
pub fn str_property<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
