//! Pure analysis engine: normalization, comparison and portfolio analytics.
//!
//! Nothing in here performs I/O or reads the clock; time is always passed in.

pub mod analytics;
pub mod comparison;
pub mod error;
pub mod normalizer;

pub use analytics::{aggregate, derive_metrics, filter_months};
pub use comparison::{compare, ComparisonSubject};
pub use error::{InsufficientContractsError, MalformedAnalysisError};
pub use normalizer::{normalize, NormalizeContext};

/// `part / whole`, or 0 when `whole` is 0.
pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// `part / whole` in percent, or 0 when `whole` is 0.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    ratio(part, whole) * 100.0
}
