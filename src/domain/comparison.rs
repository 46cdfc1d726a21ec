//! Cross-contract comparison output.
//!
//! Every insight table holds exactly one row per compared contract, in the
//! order the contracts were given.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{PaymentAmount, StructuredTerms};

/// Request DTO for a comparison
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareContractsRequest {
    pub contract_ids: Vec<Uuid>,
}

/// Risk counts for one contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskRollup {
    pub contract_id: Uuid,
    pub file_name: String,
    pub high_risks: usize,
    pub medium_risks: usize,
    pub low_risks: usize,
    pub total_risks: usize,
    /// This contract's share of all flags in the comparison, in percent.
    pub risk_share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInsight {
    pub contract_id: Uuid,
    pub file_name: String,
    pub total_value: Option<String>,
    /// `total_value` read as a number, when it parses.
    pub parsed_total_value: Option<Decimal>,
    pub currency: Option<String>,
    pub payment_amounts: Vec<PaymentAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateInsight {
    pub contract_id: Uuid,
    pub file_name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegalInsight {
    pub contract_id: Uuid,
    pub file_name: String,
    pub governing_law: Option<String>,
    pub jurisdiction: Option<String>,
    pub dispute_resolution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermsInsight {
    pub contract_id: Uuid,
    pub file_name: String,
    pub terms: StructuredTerms,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ComparisonInsights {
    pub financial: Vec<FinancialInsight>,
    pub dates: Vec<DateInsight>,
    pub legal: Vec<LegalInsight>,
    pub terms: Vec<TermsInsight>,
}

/// Totals and maxima across all compared contracts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RiskDifferences {
    pub total_high_risks: usize,
    pub total_medium_risks: usize,
    pub total_low_risks: usize,
    pub max_high_risks: usize,
    pub max_medium_risks: usize,
    pub max_low_risks: usize,
}

/// Whether a contract sits at the maximum of each dimension. Ties flag every
/// tied contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractHighlight {
    pub contract_id: Uuid,
    pub is_max_high: bool,
    pub is_max_medium: bool,
    pub is_max_low: bool,
    pub is_highest_value: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub contracts: Vec<RiskRollup>,
    pub insights: ComparisonInsights,
    pub differences: RiskDifferences,
    pub highlights: Vec<ContractHighlight>,
}
