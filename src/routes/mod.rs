pub mod analytics;
pub mod comparison;
pub mod contracts;
pub mod health;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Contracts
        .route(
            "/contracts",
            post(contracts::create_contract).get(contracts::list_contracts),
        )
        .route("/contracts/compare", post(comparison::compare_contracts))
        .route(
            "/contracts/:contract_id",
            get(contracts::get_contract).delete(contracts::delete_contract),
        )
        .route(
            "/contracts/:contract_id/analyze",
            post(contracts::analyze_contract),
        )
        .route(
            "/contracts/:contract_id/analysis",
            get(contracts::get_analysis),
        )
        // Portfolio
        .route("/analytics", get(analytics::get_analytics))
}
