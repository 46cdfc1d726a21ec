use axum::extract::{Query, State};
use chrono::Utc;
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::analytics::{AnalyticsQuery, AnalyticsResponse, PortfolioAnalytics};
use crate::engine::{aggregate, derive_metrics, filter_months};

/// Portfolio dashboard. `?months=N` narrows the monthly buckets, and the
/// per-month average, to the last N calendar months.
///
/// GET /analytics
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> DataResponse<AnalyticsResponse> {
    let contracts = state.store.snapshot();
    let analytics = aggregate(&contracts);

    let contracts_by_month = match query.months {
        Some(months) => filter_months(
            &analytics.contracts_by_month,
            months,
            Utc::now().date_naive(),
        ),
        None => analytics.contracts_by_month.clone(),
    };
    let metrics = derive_metrics(&analytics, &contracts_by_month);

    tracing::debug!(
        total = analytics.total_contracts,
        completed = analytics.completed_contracts,
        window_months = ?query.months,
        "Analytics computed"
    );

    DataResponse::new(AnalyticsResponse {
        analytics: PortfolioAnalytics {
            contracts_by_month,
            ..analytics
        },
        metrics,
        window_months: query.months,
    })
}
