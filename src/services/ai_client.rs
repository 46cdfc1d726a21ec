//! AI service client for contract analysis.
//!
//! The analysis service is treated as opaque: it takes extracted contract
//! text and returns untyped JSON, which is handed to the normalizer. Transport
//! failures, 429 and 5xx responses are retried with exponential backoff.

use anyhow::{Context, Result};
use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::error::ApiError;

/// Client for the AI service.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    token: String,
    max_retry: Duration,
}

/// Error response from AI service.
#[derive(Debug, Deserialize)]
struct AiErrorResponse {
    message: String,
}

impl AiClient {
    /// Create a new AI service client.
    pub fn new(
        base_url: &str,
        token: &str,
        timeout_seconds: u64,
        max_retry_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "AI client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            max_retry: Duration::from_secs(max_retry_seconds),
        })
    }

    /// Make a POST request to the AI service, retrying transient failures.
    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
        request_id: Option<&str>,
    ) -> Result<R, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let client = &self.client;
        let token = self.token.as_str();
        let url_ref = url.as_str();

        let policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(self.max_retry))
            .build();

        backoff::future::retry_notify(
            policy,
            || async move {
                let mut req = client
                    .post(url_ref)
                    .header("X-Internal-Token", token)
                    .header("Content-Type", "application/json");

                if let Some(rid) = request_id {
                    req = req.header("x-request-id", rid);
                }

                debug!(url = %url_ref, "AI service request");

                let response = req.json(body).send().await.map_err(|e| {
                    backoff::Error::transient(ApiError::Internal(anyhow::anyhow!(
                        "AI service unavailable: {}",
                        e
                    )))
                })?;

                let status = response.status();

                if status.is_success() {
                    return response.json::<R>().await.map_err(|e| {
                        error!(error = %e, "Failed to parse AI service response");
                        backoff::Error::permanent(ApiError::Internal(anyhow::anyhow!(
                            "Invalid AI service response: {}",
                            e
                        )))
                    });
                }

                let message = response
                    .json::<AiErrorResponse>()
                    .await
                    .map(|e| e.message)
                    .unwrap_or_else(|_| format!("AI service error: {}", status));

                Err(classify(status, message))
            },
            |err: ApiError, wait: Duration| {
                warn!(error = %err, retry_in_ms = wait.as_millis() as u64, "AI service call failed, retrying");
            },
        )
        .await
    }

    /// Check AI service health.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("AI service health check failed")?
            .error_for_status()
            .context("AI service unhealthy")?;

        Ok(())
    }

    /// Run the analysis model over extracted contract text.
    ///
    /// The result is deliberately untyped; see [`crate::engine::normalize`].
    #[instrument(skip(self, document_text), fields(chars = document_text.len()))]
    pub async fn analyze_contract(
        &self,
        document_text: &str,
        request_id: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        #[derive(Serialize)]
        struct Request<'a> {
            document_text: &'a str,
        }

        self.post(
            "/v1/contracts/analyze",
            &Request { document_text },
            request_id,
        )
        .await
    }
}

/// Map a non-success status to an error, marking which ones are worth retrying.
fn classify(status: StatusCode, message: String) -> backoff::Error<ApiError> {
    match status {
        StatusCode::BAD_REQUEST => backoff::Error::permanent(ApiError::BadRequest(message)),
        StatusCode::UNAUTHORIZED => {
            error!("AI service authentication failed");
            backoff::Error::permanent(ApiError::Internal(anyhow::anyhow!("AI service auth error")))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            backoff::Error::transient(ApiError::Internal(anyhow::anyhow!(message)))
        }
        s if s.is_server_error() => {
            error!(status = %s, message = %message, "AI service error");
            backoff::Error::transient(ApiError::Internal(anyhow::anyhow!(message)))
        }
        _ => backoff::Error::permanent(ApiError::Internal(anyhow::anyhow!(message))),
    }
}
