//! Graph context retrieval: contract id → bounded snapshot of connected entities.
//!
//! Every operation is a read-only projection issued as one [`Traversal`].

use std::sync::Arc;

use tracing::debug;

use crate::context::{
    ClauseContext, ClauseInfo, CompanyRef, GraphContext, RiskContext, RiskFactor, RiskLevel,
    SimilarContract, TRAVERSAL_DEPTH,
};
use crate::error::{GraphError, require_non_blank};
use crate::model::{NodeLabel, RelationType, str_property};
use crate::store::GraphStore;
use crate::traversal::{Expansion, Neighbor, NodeSelector, Traversal};

/// Default clause cap for [`ContextOptions`].
pub const DEFAULT_MAX_CLAUSES: usize = 10;

/// Which entity categories a graph context includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Expand `PARTY_TO` to companies.
    pub include_companies: bool,
    /// Expand `CONTAINS` to clauses.
    pub include_clauses: bool,
    /// Expand `HAS_RISK` to risk factors.
    pub include_risks: bool,
    /// Clause cap applied inside the traversal.
    pub max_clauses: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            include_companies: true,
            include_clauses: true,
            include_risks: true,
            max_clauses: DEFAULT_MAX_CLAUSES,
        }
    }
}

/// Retrieves graph context for contracts from a [`GraphStore`].
#[derive(Clone)]
pub struct GraphContextRetriever {
    store: Arc<dyn GraphStore>,
}

impl std::fmt::Debug for GraphContextRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphContextRetriever").finish_non_exhaustive()
    }
}

fn contract_selector(contract_id: &str) -> NodeSelector {
    NodeSelector::new(NodeLabel::Contract, "id", contract_id.trim())
}

/// Push `expansion` when enabled and return its result slot.
fn push_slot(traversal: &mut Traversal, enabled: bool, expansion: Expansion) -> Option<usize> {
    if !enabled {
        return None;
    }
    traversal.expansions.push(expansion);
    Some(traversal.expansions.len() - 1)
}

fn edge_role(neighbor: &Neighbor) -> String {
    str_property(&neighbor.edge.properties, "role")
        .unwrap_or_default()
        .to_string()
}

impl GraphContextRetriever {
    /// Create a retriever over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Snapshot of one contract's metadata, parties, clauses and risks.
    ///
    /// Returns `Ok(None)` only when no contract node matches.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidArgument`] for a blank id; store errors otherwise.
    pub async fn get_context_for_contract(
        &self,
        contract_id: &str,
        options: &ContextOptions,
    ) -> Result<Option<GraphContext>, GraphError> {
        require_non_blank(contract_id, "contract_id")?;

        let mut traversal = Traversal::from(contract_selector(contract_id));
        let companies_slot = push_slot(
            &mut traversal,
            options.include_companies,
            Expansion::incoming(RelationType::PartyTo),
        );
        let clauses_slot = push_slot(
            &mut traversal,
            options.include_clauses,
            Expansion::outgoing(RelationType::Contains).limit(options.max_clauses),
        );
        let risks_slot = push_slot(
            &mut traversal,
            options.include_risks,
            Expansion::outgoing(RelationType::HasRisk),
        );

        let Some(row) = self.store.traverse(&traversal).await? else {
            debug!(event = "graph.context.not_found", contract_id, "no contract node");
            return Ok(None);
        };

        let companies: Vec<CompanyRef> = companies_slot
            .map(|slot| {
                row.expanded(slot)
                    .filter_map(|n| {
                        n.node.str_property("name").map(|name| CompanyRef {
                            name: name.to_string(),
                            role: edge_role(n),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        let related_clauses: Vec<ClauseInfo> = clauses_slot
            .map(|slot| {
                row.expanded(slot)
                    .filter_map(|n| ClauseInfo::from_node(&n.node))
                    .collect()
            })
            .unwrap_or_default();
        let risk_factors: Vec<RiskFactor> = risks_slot
            .map(|slot| {
                row.expanded(slot)
                    .filter_map(|n| RiskFactor::from_node(&n.node))
                    .collect()
            })
            .unwrap_or_default();

        let node_id = row.node.id;
        let mut contract_metadata = row.node.properties;
        contract_metadata.remove("id");
        contract_metadata.retain(|_, value| !value.is_null());

        debug!(
            event = "graph.context.loaded",
            contract_id,
            companies = companies.len(),
            clauses = related_clauses.len(),
            risks = risk_factors.len(),
            "graph context loaded"
        );

        Ok(Some(GraphContext {
            contract_id: node_id,
            contract_metadata,
            companies,
            related_clauses,
            risk_factors,
            traversal_depth: TRAVERSAL_DEPTH,
        }))
    }

    /// First clause of `clause_type` in the contract, with the risks that affect it.
    ///
    /// Returns `Ok(None)` when the contract or a clause of that type is missing.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidArgument`] for blank arguments; store errors otherwise.
    pub async fn get_context_for_clause_type(
        &self,
        contract_id: &str,
        clause_type: &str,
    ) -> Result<Option<ClauseContext>, GraphError> {
        require_non_blank(contract_id, "contract_id")?;
        require_non_blank(clause_type, "clause_type")?;

        let traversal = Traversal::from(contract_selector(contract_id)).expand(
            Expansion::outgoing(RelationType::Contains)
                .filter("clause_type", clause_type.trim())
                .limit(1)
                .then(Expansion::incoming(RelationType::Affects)),
        );
        let Some(row) = self.store.traverse(&traversal).await? else {
            return Ok(None);
        };
        let Some(clause_neighbor) = row.expanded(0).next() else {
            return Ok(None);
        };
        let Some(clause) = ClauseInfo::from_node(&clause_neighbor.node) else {
            return Ok(None);
        };
        let related_risks = clause_neighbor
            .expanded(0)
            .filter_map(|n| RiskFactor::from_node(&n.node))
            .collect();
        Ok(Some(ClauseContext {
            clause,
            related_risks,
        }))
    }

    /// Contracts the company is party to, most recent upload first.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidArgument`] for a blank name or zero limit; store errors otherwise.
    pub async fn find_similar_contracts_by_company(
        &self,
        company_name: &str,
        limit: usize,
    ) -> Result<Vec<SimilarContract>, GraphError> {
        require_non_blank(company_name, "company_name")?;
        if limit == 0 {
            return Err(GraphError::InvalidArgument(
                "limit must be greater than 0".to_string(),
            ));
        }

        let traversal = Traversal::from(NodeSelector::new(
            NodeLabel::Company,
            "name",
            company_name.trim(),
        ))
        .expand(
            Expansion::outgoing(RelationType::PartyTo)
                .order_by("upload_date", true)
                .limit(limit),
        );
        let Some(row) = self.store.traverse(&traversal).await? else {
            debug!(event = "graph.company.not_found", company_name, "no company node");
            return Ok(Vec::new());
        };
        Ok(row
            .expanded(0)
            .map(|n| SimilarContract {
                contract_id: n.node.str_property("id").unwrap_or(&n.node.id).to_string(),
                filename: n
                    .node
                    .str_property("filename")
                    .unwrap_or_default()
                    .to_string(),
                risk_level: n
                    .node
                    .str_property("risk_level")
                    .map(RiskLevel::parse)
                    .unwrap_or_default(),
                role: edge_role(n),
            })
            .collect())
    }

    /// Risk factors of a contract (optionally one level), each with its affected clause text.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidArgument`] for a blank id; store errors otherwise.
    pub async fn get_risk_context(
        &self,
        contract_id: &str,
        risk_level: Option<RiskLevel>,
    ) -> Result<Vec<RiskContext>, GraphError> {
        require_non_blank(contract_id, "contract_id")?;

        let mut risks = Expansion::outgoing(RelationType::HasRisk)
            .then(Expansion::outgoing(RelationType::Affects).limit(1));
        if let Some(level) = risk_level {
            risks = risks.filter("risk_level", level.as_str());
        }
        let traversal = Traversal::from(contract_selector(contract_id)).expand(risks);
        let Some(row) = self.store.traverse(&traversal).await? else {
            return Ok(Vec::new());
        };
        Ok(row
            .expanded(0)
            .filter_map(|n| {
                let risk = RiskFactor::from_node(&n.node)?;
                let clause_content = n
                    .expanded(0)
                    .next()
                    .and_then(|clause| clause.node.str_property("content"))
                    .map(str::to_string);
                Some(RiskContext {
                    risk,
                    clause_content,
                })
            })
            .collect())
    }
}
