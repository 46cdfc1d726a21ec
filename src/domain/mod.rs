//! Domain types and DTOs
//!
//! The analysis record, the contract lifecycle around it, and the shapes
//! produced by comparison and portfolio analytics.

pub mod analysis;
pub mod analytics;
pub mod comparison;
pub mod contracts;

pub use analysis::ContractAnalysis;
pub use contracts::Contract;
