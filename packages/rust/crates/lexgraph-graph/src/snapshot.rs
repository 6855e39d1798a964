//! JSON graph snapshots for seeding an [`InMemoryGraphStore`].
//!
//! ```json
//! {
//!   "contracts": [{
//!     "id": "c1",
//!     "metadata": {"filename": "msa.pdf", "upload_date": "2024-03-01"},
//!     "parties": [{"name": "Acme Corp", "role": "licensor"}],
//!     "clauses": [{"id": "c1-term", "section_name": "12. Termination",
//!                  "clause_type": "termination", "content": "..."}],
//!     "risks": [{"concern": "...", "risk_level": "high", "clause_id": "c1-term"}]
//!   }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::{ClauseInfo, CompanyRef, RiskFactor, RiskLevel};
use crate::error::GraphError;
use crate::memory::InMemoryGraphStore;
use crate::model::Properties;

/// A whole graph as a list of contracts with their connected entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Contracts.
    #[serde(default)]
    pub contracts: Vec<ContractRecord>,
}

/// One contract and its connected entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Contract id.
    pub id: String,
    /// Contract node properties.
    #[serde(default)]
    pub metadata: Properties,
    /// Parties.
    #[serde(default)]
    pub parties: Vec<CompanyRef>,
    /// Clauses.
    #[serde(default)]
    pub clauses: Vec<ClauseRecord>,
    /// Risk factors.
    #[serde(default)]
    pub risks: Vec<RiskRecord>,
}

/// Clause entry; `id` defaults to `<contract>#clause-<n>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClauseRecord {
    /// Optional explicit id.
    #[serde(default)]
    pub id: Option<String>,
    /// Section heading.
    #[serde(default)]
    pub section_name: String,
    /// Clause category.
    #[serde(default)]
    pub clause_type: String,
    /// Clause text.
    #[serde(default)]
    pub content: String,
}

/// Risk entry; `id` defaults to `<contract>#risk-<n>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Optional explicit id.
    #[serde(default)]
    pub id: Option<String>,
    /// Short statement of the concern.
    #[serde(default)]
    pub concern: String,
    /// Severity.
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Section label. Without `clause_id`, links the clause whose
    /// `section_name` matches exactly.
    #[serde(default)]
    pub section: String,
    /// Explanation.
    #[serde(default)]
    pub description: String,
    /// Id of the clause this risk affects; takes precedence over `section`.
    #[serde(default)]
    pub clause_id: Option<String>,
}

impl GraphSnapshot {
    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Snapshot`] on malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, GraphError> {
        serde_json::from_str(raw).map_err(|e| GraphError::Snapshot(e.to_string()))
    }

    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Snapshot`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, GraphError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Snapshot(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Load every contract into `store`.
    ///
    /// # Errors
    ///
    /// Returns the first write error (blank ids, dangling `clause_id`).
    pub async fn load_into(&self, store: &InMemoryGraphStore) -> Result<(), GraphError> {
        for contract in &self.contracts {
            store
                .add_contract(&contract.id, contract.metadata.clone())
                .await?;
            for party in &contract.parties {
                store.link_party(&contract.id, party).await?;
            }
            let clauses: Vec<ClauseInfo> = contract
                .clauses
                .iter()
                .enumerate()
                .map(|(index, record)| ClauseInfo {
                    id: record
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("{}#clause-{}", contract.id, index + 1)),
                    section_name: record.section_name.clone(),
                    clause_type: record.clause_type.clone(),
                    content: record.content.clone(),
                })
                .collect();
            for clause in &clauses {
                store.add_clause(&contract.id, clause).await?;
            }
            for (index, record) in contract.risks.iter().enumerate() {
                let risk = RiskFactor {
                    id: record
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("{}#risk-{}", contract.id, index + 1)),
                    concern: record.concern.clone(),
                    risk_level: record.risk_level,
                    section: record.section.clone(),
                    description: record.description.clone(),
                };
                let affects = record
                    .clause_id
                    .as_deref()
                    .or_else(|| clause_for_section(&clauses, &record.section));
                store.add_risk(&contract.id, &risk, affects).await?;
            }
        }
        let stats = store.stats().await;
        info!(
            contracts = self.contracts.len(),
            nodes = stats.nodes,
            edges = stats.edges,
            "loaded graph snapshot"
        );
        Ok(())
    }

    /// Build a fresh store from this snapshot.
    ///
    /// # Errors
    ///
    /// See [`GraphSnapshot::load_into`].
    pub async fn into_store(&self) -> Result<InMemoryGraphStore, GraphError> {
        let store = InMemoryGraphStore::new();
        self.load_into(&store).await?;
        Ok(store)
    }
}

/// First clause whose `section_name` equals a non-empty `section`.
fn clause_for_section<'a>(clauses: &'a [ClauseInfo], section: &str) -> Option<&'a str> {
    if section.is_empty() {
        return None;
    }
    clauses
        .iter()
        .find(|clause| clause.section_name == section)
        .map(|clause| clause.id.as_str())
}
