use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::{Limits, Settings};
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{AiClient, ContractStore};

/// Room for JSON framing and the other request fields around the text.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    pub store: ContractStore,
    pub ai_client: AiClient,
}

impl AppState {
    pub fn new(settings: Settings, store: ContractStore, ai_client: AiClient) -> Arc<Self> {
        Arc::new(Self {
            settings,
            store,
            ai_client,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Spans at DEBUG keep INFO output to one line per request outcome
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let (set_request_id, propagate_request_id) = request_id_layer();
    let body_limit = RequestBodyLimitLayer::new(max_body_bytes(&state.settings.limits));

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(body_limit)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

/// Upper bound on a request body: the longest accepted text in UTF-8 plus
/// framing.
fn max_body_bytes(limits: &Limits) -> usize {
    limits
        .max_document_chars
        .saturating_mul(4)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .max_age(max_age)
}
