//! Portfolio analytics output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::analysis::SeverityCounts;

/// Query for the analytics dashboard
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalyticsQuery {
    /// Restrict monthly buckets to the last N calendar months.
    pub months: Option<u32>,
}

/// Aggregate statistics over a contract collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalytics {
    pub total_contracts: usize,
    pub completed_contracts: usize,
    pub total_risk_flags: usize,
    pub high_risk_contracts: usize,
    pub risk_distribution: SeverityCounts,
    /// Sparse: only months with at least one contract have a key.
    pub contracts_by_month: BTreeMap<String, usize>,
}

/// Ratios derived from [`PortfolioAnalytics`]. All zero when their
/// denominator is zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub success_rate: f64,
    pub avg_risk_per_contract: f64,
    pub high_risk_percentage: f64,
    pub avg_per_month: f64,
}

/// Dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub analytics: PortfolioAnalytics,
    pub metrics: DerivedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_months: Option<u32>,
}
