//! Contract submission, lookup and export.
//!
//! Analysis runs in the background: submission answers 202 with the contract
//! in `processing`, and clients poll `GET /contracts/:contract_id` until it
//! reaches `completed` or `failed`.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Accepted, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::config::Limits;
use crate::domain::contracts::{AnalyzeContractRequest, ContractSummary, CreateContractRequest};
use crate::domain::{Contract, ContractAnalysis};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestIdExt;
use crate::services::analysis::spawn_analysis;

fn validate_text(text: &str, limits: &Limits) -> ApiResult<()> {
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("Contract text is empty"));
    }
    let chars = text.chars().count();
    if chars > limits.max_document_chars {
        return Err(ApiError::bad_request(format!(
            "Contract text is {} characters; the limit is {}",
            chars, limits.max_document_chars
        )));
    }
    Ok(())
}

/// Submit extracted contract text for analysis.
///
/// POST /contracts
pub async fn create_contract(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContractRequest>,
) -> ApiResult<Accepted<Contract>> {
    let file_name = req.file_name.trim();
    if file_name.is_empty() {
        return Err(ApiError::bad_request("fileName is required"));
    }
    validate_text(&req.text, &state.settings.limits)?;

    let now = Utc::now();
    let contract = Contract::new(file_name, req.file_type.trim(), now);
    let contract_id = contract.id;
    state.store.insert(contract)?;

    let contract = state.store.update(contract_id, |c| {
        c.begin_processing(now)?;
        Ok(c.clone())
    })?;

    tracing::info!(
        contract_id = %contract_id,
        file_name = %contract.file_name,
        chars = req.text.len(),
        "Contract submitted for analysis"
    );

    spawn_analysis(state.clone(), contract_id, req.text, headers.owned_request_id());

    Ok(Accepted(contract))
}

/// List contracts, newest first.
///
/// GET /contracts
pub async fn list_contracts(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Paginated<ContractSummary> {
    let (page, total) = state.store.list(pagination.offset(), pagination.limit());
    tracing::debug!(
        page = pagination.page(),
        per_page = pagination.per_page(),
        total,
        "Listing contracts"
    );

    let summaries = page.iter().map(ContractSummary::from).collect();
    Paginated::new(summaries, &pagination, total)
}

/// GET /contracts/:contract_id
pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> ApiResult<DataResponse<Contract>> {
    let contract = state
        .store
        .get(contract_id)
        .ok_or_else(|| ApiError::not_found(format!("Contract {} not found", contract_id)))?;
    Ok(DataResponse::new(contract))
}

/// DELETE /contracts/:contract_id
pub async fn delete_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    let removed = state.store.remove(contract_id)?;
    tracing::info!(contract_id = %contract_id, status = %removed.status, "Contract deleted");
    Ok(NoContent)
}

/// Re-run analysis on a contract that is not already processing.
///
/// POST /contracts/:contract_id/analyze
pub async fn analyze_contract(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<AnalyzeContractRequest>,
) -> ApiResult<Accepted<Contract>> {
    validate_text(&req.text, &state.settings.limits)?;

    let contract = state.store.update(contract_id, |c| {
        c.begin_processing(Utc::now())?;
        Ok(c.clone())
    })?;

    tracing::info!(contract_id = %contract_id, "Contract re-submitted for analysis");
    spawn_analysis(state.clone(), contract_id, req.text, headers.owned_request_id());

    Ok(Accepted(contract))
}

/// Export the analysis exactly as stored.
///
/// GET /contracts/:contract_id/analysis
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<Uuid>,
) -> ApiResult<Json<ContractAnalysis>> {
    let contract = state
        .store
        .get(contract_id)
        .ok_or_else(|| ApiError::not_found(format!("Contract {} not found", contract_id)))?;

    match contract.completed_analysis() {
        Some(analysis) => Ok(Json(analysis.clone())),
        None => Err(ApiError::not_found(format!(
            "Contract {} has no completed analysis (status: {})",
            contract_id, contract.status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_oversized_text() {
        let limits = Limits {
            max_document_chars: 5,
            ..Limits::default()
        };
        assert!(validate_text("   \n", &limits).is_err());
        assert!(validate_text("abcdef", &limits).is_err());
        assert!(validate_text("abcde", &limits).is_ok());
        // Counted in characters, not bytes
        assert!(validate_text("ééééé", &limits).is_ok());
    }
}
