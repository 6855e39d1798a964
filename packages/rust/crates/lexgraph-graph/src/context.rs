//! Graph context snapshot types returned by [`crate::GraphContextRetriever`].

use serde::{Deserialize, Serialize};

use crate::model::{GraphNode, Properties};

/// Traversal depth of every graph context (single-hop expansion).
pub const TRAVERSAL_DEPTH: u8 = 1;

/// Risk severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// High severity.
    High,
    /// Medium severity.
    Medium,
    /// Low severity.
    Low,
    /// Missing or unrecognised severity.
    #[default]
    Unknown,
}

impl RiskLevel {
    /// Parse case-insensitively; anything unrecognised is `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Self::High,
            "medium" | "moderate" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    /// Lowercase name as stored in the graph.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company that is party to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRef {
    /// Company name.
    pub name: String,
    /// Role in the contract (e.g. "licensor"); empty when unrecorded.
    #[serde(default)]
    pub role: String,
}

/// A clause of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseInfo {
    /// Clause node id.
    pub id: String,
    /// Section heading the clause was extracted from.
    #[serde(default)]
    pub section_name: String,
    /// Clause category (e.g. "termination", "indemnification").
    #[serde(default)]
    pub clause_type: String,
    /// Clause text.
    #[serde(default)]
    pub content: String,
}

/// A risk factor attached to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Risk node id.
    pub id: String,
    /// Short statement of the concern.
    #[serde(default)]
    pub concern: String,
    /// Severity.
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Section the risk was recorded against (informational only).
    #[serde(default)]
    pub section: String,
    /// Longer explanation or recommendation.
    #[serde(default)]
    pub description: String,
}

/// Bounded snapshot of the entities connected to one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphContext {
    /// Contract id.
    pub contract_id: String,
    /// Contract node properties other than its id; may be empty.
    pub contract_metadata: Properties,
    /// Parties to the contract.
    pub companies: Vec<CompanyRef>,
    /// Clauses, capped at query time.
    pub related_clauses: Vec<ClauseInfo>,
    /// Risk factors.
    pub risk_factors: Vec<RiskFactor>,
    /// Always [`TRAVERSAL_DEPTH`].
    pub traversal_depth: u8,
}

/// A clause with the risk factors connected to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseContext {
    /// The clause.
    pub clause: ClauseInfo,
    /// Risk factors that affect the clause.
    pub related_risks: Vec<RiskFactor>,
}

/// A contract sharing a company with the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarContract {
    /// Contract id.
    pub contract_id: String,
    /// Source filename, empty when unrecorded.
    pub filename: String,
    /// Overall contract risk level.
    pub risk_level: RiskLevel,
    /// The company's role in this contract.
    pub role: String,
}

/// A risk factor with the content of the clause it affects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskContext {
    /// The risk factor.
    pub risk: RiskFactor,
    /// Content of the affected clause, if the risk is linked to one.
    pub clause_content: Option<String>,
}

fn owned(node: &GraphNode, key: &str) -> String {
    node.str_property(key).unwrap_or_default().to_string()
}

impl ClauseInfo {
    /// Build from a `Clause` node; `None` when the node carries no usable content.
    #[must_use]
    pub fn from_node(node: &GraphNode) -> Option<Self> {
        let clause = Self {
            id: node.id.clone(),
            section_name: owned(node, "section_name"),
            clause_type: owned(node, "clause_type"),
            content: owned(node, "content"),
        };
        if clause.content.is_empty() && clause.section_name.is_empty() {
            return None;
        }
        Some(clause)
    }
}

impl RiskFactor {
    /// Build from a `RiskFactor` node; `None` when the node has no concern or description.
    #[must_use]
    pub fn from_node(node: &GraphNode) -> Option<Self> {
        let risk = Self {
            id: node.id.clone(),
            concern: owned(node, "concern"),
            risk_level: node
                .str_property("risk_level")
                .map(RiskLevel::parse)
                .unwrap_or_default(),
            section: owned(node, "section"),
            description: owned(node, "description"),
        };
        if risk.concern.is_empty() && risk.description.is_empty() {
            return None;
        }
        Some(risk)
    }
}
