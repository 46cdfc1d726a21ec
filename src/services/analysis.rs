//! Analysis pipeline: AI call -> normalize -> contract status change.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::store::{ContractStore, StoreError};
use crate::app::AppState;
use crate::domain::contracts::ContractStatus;
use crate::engine::{normalize, NormalizeContext};
use crate::error::ApiError;

/// Key some analysis deployments wrap their result in.
const ENVELOPE_KEY: &str = "analysis";

/// Reason stored on a contract when the AI call itself failed.
const AI_FAILURE_REASON: &str = "analysis service request failed";

/// Strip an `{"analysis": {...}}` wrapper when the payload is not already
/// an analysis.
fn unwrap_envelope(response: Value) -> Value {
    if let Value::Object(map) = &response {
        if !map.contains_key("summary") {
            if let Some(inner @ Value::Object(_)) = map.get(ENVELOPE_KEY) {
                return inner.clone();
            }
        }
    }
    response
}

/// Settle a `processing` contract with the outcome of its AI call.
///
/// A successful, well-formed payload completes the contract; an AI failure
/// or a malformed payload fails it with a reason.
pub fn record_outcome(
    store: &ContractStore,
    contract_id: Uuid,
    outcome: Result<Value, ApiError>,
    ctx: &NormalizeContext,
) -> Result<ContractStatus, StoreError> {
    let normalized = match outcome {
        Ok(raw) => normalize(&unwrap_envelope(raw), ctx).map_err(|e| {
            tracing::warn!(contract_id = %contract_id, error = %e, "Rejected malformed analysis");
            e.to_string()
        }),
        Err(e) => {
            tracing::warn!(contract_id = %contract_id, error = ?e, "AI analysis call failed");
            Err(AI_FAILURE_REASON.to_string())
        }
    };

    store.update(contract_id, |contract| match normalized {
        Ok(analysis) => {
            contract.complete(analysis, ctx.analyzed_at)?;
            Ok(ContractStatus::Completed)
        }
        Err(reason) => {
            contract.fail(reason, ctx.analyzed_at)?;
            Ok(ContractStatus::Failed)
        }
    })
}

/// Call the AI service for a contract already in `processing` and record
/// the result.
pub async fn run_analysis(
    state: Arc<AppState>,
    contract_id: Uuid,
    text: String,
    request_id: Option<String>,
) {
    let outcome = state
        .ai_client
        .analyze_contract(&text, request_id.as_deref())
        .await;
    let ctx = NormalizeContext::new(Utc::now(), state.settings.ai_model.clone());

    match record_outcome(&state.store, contract_id, outcome, &ctx) {
        Ok(status) => {
            tracing::info!(contract_id = %contract_id, status = %status, "Contract analysis finished")
        }
        Err(e) => {
            // Usually the contract was deleted or re-submitted while the call ran.
            tracing::warn!(contract_id = %contract_id, error = %e, "Analysis result discarded")
        }
    }
}

/// Run [`run_analysis`] in the background.
pub fn spawn_analysis(
    state: Arc<AppState>,
    contract_id: Uuid,
    text: String,
    request_id: Option<String>,
) {
    tokio::spawn(run_analysis(state, contract_id, text, request_id));
}
