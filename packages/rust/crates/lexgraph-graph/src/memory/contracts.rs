//! Contract-domain write helpers for the in-memory store.

use tracing::debug;

use super::InMemoryGraphStore;
use crate::context::{ClauseInfo, CompanyRef, RiskFactor};
use crate::error::{GraphError, require_non_blank};
use crate::model::{GraphEdge, GraphNode, NodeLabel, Properties, RelationType};

/// Node id used for a company name.
#[must_use]
pub fn company_node_id(name: &str) -> String {
    format!("company:{}", name.trim().to_lowercase())
}

impl InMemoryGraphStore {
    /// Add (or replace) a contract node. `metadata` becomes the node properties.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidArgument`] for a blank id.
    pub async fn add_contract(
        &self,
        contract_id: &str,
        metadata: Properties,
    ) -> Result<(), GraphError> {
        require_non_blank(contract_id, "contract_id")?;
        let mut node = GraphNode::new(contract_id, NodeLabel::Contract);
        node.properties = metadata;
        node.properties
            .insert("id".to_string(), contract_id.to_string().into());
        self.add_node(node).await;
        Ok(())
    }

    /// Link a company to a contract, creating the company node on first use.
    /// Linking the same company twice keeps the first edge and its role.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank company name or an unknown contract.
    pub async fn link_party(
        &self,
        contract_id: &str,
        company: &CompanyRef,
    ) -> Result<(), GraphError> {
        require_non_blank(&company.name, "company name")?;
        let company_id = company_node_id(&company.name);
        if self.get_node(&company_id).await.is_none() {
            self.add_node(
                GraphNode::new(company_id.clone(), NodeLabel::Company)
                    .with_property("name", company.name.trim()),
            )
            .await;
        }
        if self
            .has_edge(&company_id, contract_id, RelationType::PartyTo)
            .await
        {
            debug!(contract_id, company_id = %company_id, "party already linked");
            return Ok(());
        }
        self.add_edge(
            GraphEdge::new(company_id, contract_id, RelationType::PartyTo)
                .with_property("role", company.role.clone()),
        )
        .await
    }

    /// Add a clause node and its `CONTAINS` edge.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank clause id or an unknown contract.
    pub async fn add_clause(
        &self,
        contract_id: &str,
        clause: &ClauseInfo,
    ) -> Result<(), GraphError> {
        require_non_blank(&clause.id, "clause id")?;
        if self.get_node(contract_id).await.is_none() {
            return Err(GraphError::InvalidRelation(
                contract_id.to_string(),
                clause.id.clone(),
            ));
        }
        self.add_node(
            GraphNode::new(clause.id.clone(), NodeLabel::Clause)
                .with_property("section_name", clause.section_name.clone())
                .with_property("clause_type", clause.clause_type.clone())
                .with_property("content", clause.content.clone()),
        )
        .await;
        self.add_edge(GraphEdge::new(contract_id, clause.id.clone(), RelationType::Contains))
            .await
    }

    /// Add a risk node, its `HAS_RISK` edge and, when given, the `AFFECTS` edge to a clause.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank risk id or an unknown contract/clause.
    /// Nothing is written when the contract or clause is unknown.
    pub async fn add_risk(
        &self,
        contract_id: &str,
        risk: &RiskFactor,
        affects_clause: Option<&str>,
    ) -> Result<(), GraphError> {
        require_non_blank(&risk.id, "risk id")?;
        if self.get_node(contract_id).await.is_none() {
            return Err(GraphError::InvalidRelation(
                contract_id.to_string(),
                risk.id.clone(),
            ));
        }
        if let Some(clause_id) = affects_clause
            && self.get_node(clause_id).await.is_none()
        {
            return Err(GraphError::InvalidRelation(
                risk.id.clone(),
                clause_id.to_string(),
            ));
        }
        self.add_node(
            GraphNode::new(risk.id.clone(), NodeLabel::RiskFactor)
                .with_property("concern", risk.concern.clone())
                .with_property("risk_level", risk.risk_level.as_str())
                .with_property("section", risk.section.clone())
                .with_property("description", risk.description.clone()),
        )
        .await;
        self.add_edge(GraphEdge::new(contract_id, risk.id.clone(), RelationType::HasRisk))
            .await?;
        if let Some(clause_id) = affects_clause {
            self.add_edge(GraphEdge::new(risk.id.clone(), clause_id, RelationType::Affects))
                .await?;
        }
        Ok(())
    }
}
