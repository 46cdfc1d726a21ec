mod api;
mod app;
mod config;
mod domain;
mod engine;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::{Context, Result};

use services::{AiClient, ContractStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;
    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        ai_model = %settings.ai_model,
        "Starting ContractIQ backend"
    );

    let ai_client = AiClient::new(
        &settings.ai_service_url,
        &settings.ai_service_token,
        settings.ai_service_timeout_seconds,
        settings.ai_max_retry_seconds,
    )?;

    // Non-blocking; analyses retry on their own if the service is late
    tokio::spawn({
        let ai_client = ai_client.clone();
        async move {
            match ai_client.health_check().await {
                Ok(()) => tracing::info!("AI service is healthy"),
                Err(e) => tracing::warn!(error = %e, "AI service health check failed"),
            }
        }
    });

    let store = ContractStore::new(settings.limits.max_contracts);
    let state = app::AppState::new(settings.clone(), store, ai_client);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server_addr))?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
