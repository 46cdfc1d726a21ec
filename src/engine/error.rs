use thiserror::Error;

/// Raw AI output that cannot become a `ContractAnalysis`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedAnalysisError {
    #[error("analysis payload is not a JSON object")]
    NotAnObject,

    #[error("analysis payload has no summary")]
    MissingSummary,
}

/// Comparison requested over fewer than two analyzed contracts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("at least {required} analyzed contracts are required for a comparison, got {found}")]
pub struct InsufficientContractsError {
    pub required: usize,
    pub found: usize,
}
