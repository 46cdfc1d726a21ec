use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Plan limits, passed explicitly through application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Longest accepted contract text, in characters
    pub max_document_chars: usize,
    /// Most contracts accepted in a single comparison
    pub max_compare_contracts: usize,
    /// Most contracts held by the store
    pub max_contracts: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_document_chars: 200_000,
            max_compare_contracts: 5,
            max_contracts: 1_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub log_json: bool,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // AI Service
    pub ai_service_url: String,
    pub ai_service_token: String,
    pub ai_service_timeout_seconds: u64,
    pub ai_max_retry_seconds: u64,
    pub ai_model: String,

    pub limits: Limits,
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        // JSON logs by default in production, pretty logs elsewhere
        let log_json = parsed_or("LOG_JSON", env == Environment::Prod);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // AI Service
        let ai_service_url =
            env::var("AI_SERVICE_URL").unwrap_or_else(|_| "http://ai-service:8000".to_string());
        url::Url::parse(&ai_service_url)
            .with_context(|| format!("AI_SERVICE_URL is not a valid URL: {}", ai_service_url))?;
        let ai_service_token =
            env::var("AI_SERVICE_TOKEN").context("AI_SERVICE_TOKEN must be set")?;
        let ai_service_timeout_seconds = parsed_or("AI_SERVICE_TIMEOUT_SECONDS", 120); // LLM calls are slow
        let ai_max_retry_seconds = parsed_or("AI_MAX_RETRY_SECONDS", 30);
        let ai_model =
            env::var("AI_MODEL").unwrap_or_else(|_| "contract-analyzer-v1".to_string());

        let defaults = Limits::default();
        let limits = Limits {
            max_document_chars: parsed_or("MAX_DOCUMENT_CHARS", defaults.max_document_chars),
            max_compare_contracts: parsed_or(
                "MAX_COMPARE_CONTRACTS",
                defaults.max_compare_contracts,
            ),
            max_contracts: parsed_or("MAX_CONTRACTS", defaults.max_contracts),
        };

        Ok(Settings {
            env,
            server_addr,
            log_json,
            cors_allow_origins,
            ai_service_url,
            ai_service_token,
            ai_service_timeout_seconds,
            ai_max_retry_seconds,
            ai_model,
            limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_names_are_lenient() {
        assert_eq!(Environment::from_str("PRODUCTION"), Environment::Prod);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("anything"), Environment::Dev);
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        assert_eq!(parsed_or("CONTRACTIQ_TEST_SURELY_UNSET", 42usize), 42);
    }
}
