use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
    pub contracts: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub ai_service: String,
}

/// Health check endpoint
///
/// The store is in-process, so the service itself is always up; an
/// unreachable AI service only degrades it.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai_ok = state.ai_client.health_check().await.is_ok();

    Json(HealthResponse {
        status: if ai_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceHealth {
            ai_service: if ai_ok { "ok" } else { "error" }.to_string(),
        },
        contracts: state.store.len(),
    })
}
