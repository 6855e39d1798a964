//! Graph context → typed, weighted evidence items.

use lexgraph_graph::{ClauseInfo, CompanyRef, GraphContext, RiskFactor, RiskLevel};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::RetrievalResult;

/// Kind of evidence item flattened from a graph context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphItemKind {
    /// Contract metadata summary.
    Metadata,
    /// A party to the contract.
    Company,
    /// A clause.
    Clause,
    /// A risk factor.
    Risk,
}

impl GraphItemKind {
    /// Tag stored under the `type` metadata key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Company => "company",
            Self::Clause => "clause",
            Self::Risk => "risk",
        }
    }
}

impl std::fmt::Display for GraphItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relevance weights for graph items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ItemWeights {
    /// Contract metadata item.
    pub metadata: f32,
    /// Company items.
    pub company: f32,
    /// Clause items.
    pub clause: f32,
    /// High-severity risks.
    pub risk_high: f32,
    /// Medium-severity risks.
    pub risk_medium: f32,
    /// Low-severity risks.
    pub risk_low: f32,
    /// Risks without a recognised severity.
    pub risk_unknown: f32,
}

impl Default for ItemWeights {
    fn default() -> Self {
        Self {
            metadata: 0.8,
            company: 0.7,
            clause: 0.7,
            risk_high: 0.9,
            risk_medium: 0.6,
            risk_low: 0.3,
            risk_unknown: 0.5,
        }
    }
}

impl ItemWeights {
    /// Weight for a risk of `level`.
    #[must_use]
    pub fn risk(&self, level: RiskLevel) -> f32 {
        match level {
            RiskLevel::High => self.risk_high,
            RiskLevel::Medium => self.risk_medium,
            RiskLevel::Low => self.risk_low,
            RiskLevel::Unknown => self.risk_unknown,
        }
    }
}

/// One weighted evidence item derived from a graph context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphItem {
    /// Owning contract.
    pub contract_id: String,
    /// Item kind.
    pub kind: GraphItemKind,
    /// Formatted text.
    pub content: String,
    /// Relevance weight in `[0, 1]`.
    pub weight: f32,
    /// Item metadata; always carries `type` and `contract_id`.
    pub metadata: Map<String, Value>,
}

impl GraphItem {
    fn new(contract_id: &str, kind: GraphItemKind, content: String, weight: f32) -> Self {
        let mut metadata = Map::new();
        metadata.insert("type".to_string(), Value::from(kind.as_str()));
        metadata.insert("contract_id".to_string(), Value::from(contract_id));
        Self {
            contract_id: contract_id.to_string(),
            kind,
            content,
            weight,
            metadata,
        }
    }

    fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Convert into a graph-origin retrieval result.
    #[must_use]
    pub fn into_result(self) -> RetrievalResult {
        RetrievalResult::graph(self.contract_id, self.content, self.weight, self.metadata)
    }
}

/// Per-call flattening switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Cap per kind (companies, clauses and risks each).
    pub n_graph: usize,
    /// Emit company items.
    pub include_companies: bool,
    /// Emit risk items.
    pub include_risks: bool,
}

fn metadata_content(context: &GraphContext) -> String {
    let fields: Vec<String> = context
        .contract_metadata
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}: {s}"),
            other => format!("{key}: {other}"),
        })
        .collect();
    format!("Contract {} ({})", context.contract_id, fields.join(", "))
}

fn company_content(company: &CompanyRef) -> String {
    if company.role.is_empty() {
        format!("Party: {}", company.name)
    } else {
        format!("Party: {} (role: {})", company.name, company.role)
    }
}

fn clause_content(clause: &ClauseInfo) -> String {
    let heading = match (clause.section_name.is_empty(), clause.clause_type.is_empty()) {
        (false, false) => format!("{} [{}]", clause.section_name, clause.clause_type),
        (false, true) => clause.section_name.clone(),
        (true, false) => format!("[{}]", clause.clause_type),
        (true, true) => clause.id.clone(),
    };
    format!("Clause {heading}: {}", clause.content)
}

fn risk_content(risk: &RiskFactor) -> String {
    let mut content = format!("Risk ({}): {}", risk.risk_level, risk.concern);
    if !risk.description.is_empty() {
        if !risk.concern.is_empty() {
            content.push_str(" - ");
        }
        content.push_str(&risk.description);
    }
    content
}

/// Flatten one graph context.
///
/// Emits one metadata item when metadata is non-empty, then up to `n_graph`
/// items each of companies, clauses and risks, in that order.
#[must_use]
pub fn flatten_context(
    context: &GraphContext,
    options: FlattenOptions,
    weights: &ItemWeights,
) -> Vec<GraphItem> {
    let id = context.contract_id.as_str();
    let mut items = Vec::new();

    if !context.contract_metadata.is_empty() {
        items.push(GraphItem::new(
            id,
            GraphItemKind::Metadata,
            metadata_content(context),
            weights.metadata,
        ));
    }
    if options.include_companies {
        items.extend(context.companies.iter().take(options.n_graph).map(|company| {
            GraphItem::new(id, GraphItemKind::Company, company_content(company), weights.company)
                .with_meta("name", company.name.clone())
                .with_meta("role", company.role.clone())
        }));
    }
    items.extend(context.related_clauses.iter().take(options.n_graph).map(|clause| {
        GraphItem::new(id, GraphItemKind::Clause, clause_content(clause), weights.clause)
            .with_meta("clause_id", clause.id.clone())
            .with_meta("clause_type", clause.clause_type.clone())
            .with_meta("section_name", clause.section_name.clone())
    }));
    if options.include_risks {
        items.extend(context.risk_factors.iter().take(options.n_graph).map(|risk| {
            GraphItem::new(
                id,
                GraphItemKind::Risk,
                risk_content(risk),
                weights.risk(risk.risk_level),
            )
            .with_meta("risk_id", risk.id.clone())
            .with_meta("risk_level", risk.risk_level.as_str())
        }));
    }
    items
}
