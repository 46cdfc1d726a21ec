use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::analysis::ContractAnalysis;

/// Contract processing status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl Default for ContractStatus {
    fn default() -> Self {
        Self::Uploading
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractStatus::Uploading => write!(f, "uploading"),
            ContractStatus::Processing => write!(f, "processing"),
            ContractStatus::Completed => write!(f, "completed"),
            ContractStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Rejected status change.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("contract {contract_id} cannot move from {from} to {to}")]
pub struct LifecycleError {
    pub contract_id: Uuid,
    pub from: ContractStatus,
    pub to: ContractStatus,
}

/// Contract entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub status: ContractStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ContractAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// A freshly uploaded contract.
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            status: ContractStatus::Uploading,
            analysis: None,
            error: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn reject(&self, to: ContractStatus) -> LifecycleError {
        LifecycleError {
            contract_id: self.id,
            from: self.status,
            to,
        }
    }

    /// Enter `processing`. Allowed from `uploading`, and from `completed` or
    /// `failed` for a re-analysis, which discards the previous result.
    pub fn begin_processing(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        match self.status {
            ContractStatus::Uploading | ContractStatus::Completed | ContractStatus::Failed => {
                self.status = ContractStatus::Processing;
                self.analysis = None;
                self.error = None;
                self.updated_at = at;
                Ok(())
            }
            ContractStatus::Processing => Err(self.reject(ContractStatus::Processing)),
        }
    }

    /// Attach the finished analysis. Only legal while `processing`.
    pub fn complete(
        &mut self,
        analysis: ContractAnalysis,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        if self.status != ContractStatus::Processing {
            return Err(self.reject(ContractStatus::Completed));
        }
        self.status = ContractStatus::Completed;
        self.analysis = Some(analysis);
        self.updated_at = at;
        Ok(())
    }

    /// Mark analysis as failed. Only legal while `processing`.
    pub fn fail(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        if self.status != ContractStatus::Processing {
            return Err(self.reject(ContractStatus::Failed));
        }
        self.status = ContractStatus::Failed;
        self.analysis = None;
        self.error = Some(reason.into());
        self.updated_at = at;
        Ok(())
    }

    /// The analysis, only when the contract has completed.
    pub fn completed_analysis(&self) -> Option<&ContractAnalysis> {
        match self.status {
            ContractStatus::Completed => self.analysis.as_ref(),
            _ => None,
        }
    }
}

/// Request DTO for submitting extracted contract text
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub file_name: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    pub text: String,
}

fn default_file_type() -> String {
    "txt".to_string()
}

/// Request DTO for re-analyzing an existing contract
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeContractRequest {
    pub text: String,
}

/// List item DTO; omits the full analysis body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub status: ContractStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_flag_count: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Contract> for ContractSummary {
    fn from(c: &Contract) -> Self {
        Self {
            id: c.id,
            file_name: c.file_name.clone(),
            file_type: c.file_type.clone(),
            status: c.status,
            risk_flag_count: c.completed_analysis().map(|a| a.risk_flags.len()),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
