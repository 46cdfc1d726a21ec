use axum::{extract::State, Json};
use std::collections::HashSet;
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::comparison::{CompareContractsRequest, ComparisonResult};
use crate::engine::{compare, ComparisonSubject};
use crate::error::{ApiError, ApiResult};

/// Compare analyzed contracts side by side.
///
/// Unknown ids are a 404. Contracts without a completed analysis are left
/// out, and the comparison needs two that remain.
///
/// POST /contracts/compare
pub async fn compare_contracts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareContractsRequest>,
) -> ApiResult<DataResponse<ComparisonResult>> {
    let mut seen = HashSet::new();
    let ids: Vec<_> = req
        .contract_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    let max = state.settings.limits.max_compare_contracts;
    if ids.len() > max {
        return Err(ApiError::bad_request(format!(
            "At most {} contracts can be compared at once",
            max
        )));
    }

    let contracts = state.store.get_many(&ids)?;
    let subjects: Vec<ComparisonSubject<'_>> = contracts
        .iter()
        .filter_map(ComparisonSubject::from_contract)
        .collect();

    if subjects.len() < contracts.len() {
        tracing::debug!(
            requested = contracts.len(),
            analyzed = subjects.len(),
            "Skipping contracts without a completed analysis"
        );
    }

    let result = compare(&subjects)?;
    tracing::info!(contracts = subjects.len(), "Contracts compared");

    Ok(DataResponse::new(result))
}
