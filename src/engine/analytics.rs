//! Portfolio analytics over a contract collection.

use chrono::{DateTime, Months, NaiveDate, Utc};
use std::collections::BTreeMap;

use super::{percentage, ratio};
use crate::domain::analytics::{DerivedMetrics, PortfolioAnalytics};
use crate::domain::contracts::{Contract, ContractStatus};

/// `"YYYY-MM"` bucket for a timestamp.
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Aggregate a contract collection. Never fails; an empty slice gives zeros.
///
/// Risk figures only count completed contracts.
pub fn aggregate(contracts: &[Contract]) -> PortfolioAnalytics {
    let mut analytics = PortfolioAnalytics {
        total_contracts: contracts.len(),
        ..Default::default()
    };

    for contract in contracts {
        *analytics
            .contracts_by_month
            .entry(month_key(contract.created_at))
            .or_insert(0) += 1;

        if contract.status != ContractStatus::Completed {
            continue;
        }
        analytics.completed_contracts += 1;

        if let Some(analysis) = contract.completed_analysis() {
            let counts = analysis.severity_counts();
            analytics.total_risk_flags += counts.total();
            analytics.risk_distribution += counts;
            if counts.high > 0 {
                analytics.high_risk_contracts += 1;
            }
        }
    }

    analytics
}

/// Keep the monthly buckets whose first day falls on or after `today` minus
/// `months` calendar months. Keys that are not `"YYYY-MM"` are dropped.
pub fn filter_months(
    by_month: &BTreeMap<String, usize>,
    months: u32,
    today: NaiveDate,
) -> BTreeMap<String, usize> {
    let Some(cutoff) = today.checked_sub_months(Months::new(months)) else {
        return by_month.clone();
    };

    by_month
        .iter()
        .filter(|(key, _)| {
            NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
                .map(|start| start >= cutoff)
                .unwrap_or(false)
        })
        .map(|(key, count)| (key.clone(), *count))
        .collect()
}

/// Ratios for the dashboard. `by_month` is the (possibly windowed) monthly
/// map that `avg_per_month` is computed over.
pub fn derive_metrics(
    analytics: &PortfolioAnalytics,
    by_month: &BTreeMap<String, usize>,
) -> DerivedMetrics {
    let in_window: usize = by_month.values().sum();
    DerivedMetrics {
        success_rate: percentage(analytics.completed_contracts, analytics.total_contracts),
        avg_risk_per_contract: ratio(analytics.total_risk_flags, analytics.completed_contracts),
        high_risk_percentage: percentage(
            analytics.high_risk_contracts,
            analytics.total_contracts,
        ),
        avg_per_month: ratio(in_window, by_month.len()),
    }
}
