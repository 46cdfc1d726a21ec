//! Contract analysis domain model.
//!
//! This is the durable, exported shape of one analyzed document. Values of
//! these types are produced by [`crate::engine::normalize`], so every enum
//! field already holds a member of its closed set and
//! `metadata.total_clauses` matches the clause list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowercases a label and strips everything but ASCII alphanumerics, so that
/// `"Auto Renewal"`, `"auto_renewal"` and `"auto-renewal"` compare equal.
fn label_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// =============================================================================
// Enumerations
// =============================================================================

/// Category of a detected contractual issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RiskType {
    NonCompete,
    AutoRenewal,
    Termination,
    Liability,
    Payment,
    Other,
}

impl Default for RiskType {
    fn default() -> Self {
        Self::Other
    }
}

impl RiskType {
    /// Map a free-form label to a risk type. Unrecognized labels are `Other`.
    pub fn from_label(label: &str) -> Self {
        match label_key(label).as_str() {
            "noncompete" => Self::NonCompete,
            "autorenewal" => Self::AutoRenewal,
            "termination" => Self::Termination,
            "liability" => Self::Liability,
            "payment" => Self::Payment,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for RiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskType::NonCompete => write!(f, "non-compete"),
            RiskType::AutoRenewal => write!(f, "auto-renewal"),
            RiskType::Termination => write!(f, "termination"),
            RiskType::Liability => write!(f, "liability"),
            RiskType::Payment => write!(f, "payment"),
            RiskType::Other => write!(f, "other"),
        }
    }
}

/// Severity of a risk flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Low
    }
}

impl Severity {
    /// Map a free-form label to a severity. Unrecognized labels are `Low`.
    pub fn from_label(label: &str) -> Self {
        match label_key(label).as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Importance of an explained clause.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    Important,
    Standard,
}

impl Default for Importance {
    fn default() -> Self {
        Self::Standard
    }
}

impl Importance {
    /// Map a free-form label to an importance. Unrecognized labels are `Standard`.
    pub fn from_label(label: &str) -> Self {
        match label_key(label).as_str() {
            "critical" => Self::Critical,
            "important" => Self::Important,
            _ => Self::Standard,
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Importance::Critical => write!(f, "critical"),
            Importance::Important => write!(f, "important"),
            Importance::Standard => write!(f, "standard"),
        }
    }
}

// =============================================================================
// Risk flags and clause explanations
// =============================================================================

/// A single detected contractual issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RiskFlag {
    pub id: String,
    #[serde(rename = "type")]
    pub risk_type: RiskType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Verbatim excerpt. Stored whole; truncation is a display concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Plain-language explanation of one clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClauseExplanation {
    pub clause_title: String,
    pub clause_text: String,
    pub explanation: String,
    pub importance: Importance,
}

// =============================================================================
// Extended metadata
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyParties {
    pub party1: String,
    pub party2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAmount {
    pub amount: String,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_amounts: Vec<PaymentAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContractDates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LegalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governing_law: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispute_resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signatory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub party: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub signatories: Vec<Signatory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenewalTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_renewal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_period: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TerminationTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_convenience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IntellectualPropertyTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfidentialityTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal: Option<RenewalTerms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<TerminationTerms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intellectual_property: Option<IntellectualPropertyTerms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidentiality: Option<ConfidentialityTerms>,
}

/// Derived bookkeeping; never trusted from the AI payload for `total_clauses`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub total_clauses: usize,
    pub analyzed_at: DateTime<Utc>,
    pub model: String,
}

// =============================================================================
// Aggregate
// =============================================================================

/// Full structured result for one document.
///
/// Immutable once attached to a contract: a re-analysis builds a new value
/// instead of editing this one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_parties: Option<KeyParties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub obligations: Vec<String>,
    #[serde(default)]
    pub risk_flags: Vec<RiskFlag>,
    #[serde(default)]
    pub clause_explanations: Vec<ClauseExplanation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_details: Option<FinancialDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<ContractDates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_info: Option<LegalInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_metadata: Option<ContractMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_terms: Option<StructuredTerms>,
    pub metadata: AnalysisMetadata,
}

impl ContractAnalysis {
    /// Count risk flags per severity.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for flag in &self.risk_flags {
            counts.record(flag.severity);
        }
        counts
    }

    pub fn has_high_risk(&self) -> bool {
        self.risk_flags
            .iter()
            .any(|flag| flag.severity == Severity::High)
    }
}

/// Risk flag counts per severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

impl std::ops::AddAssign for SeverityCounts {
    fn add_assign(&mut self, other: Self) {
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_analysis() -> ContractAnalysis {
        ContractAnalysis {
            summary: "Master services agreement between Acme and Globex.".to_string(),
            key_parties: Some(KeyParties {
                party1: "Acme Corp".to_string(),
                party2: "Globex LLC".to_string(),
            }),
            duration: Some("24 months".to_string()),
            payment_terms: Some("Net 30".to_string()),
            obligations: vec![
                "Deliver monthly reports".to_string(),
                "Maintain insurance".to_string(),
            ],
            risk_flags: vec![RiskFlag {
                id: "risk-1".to_string(),
                risk_type: RiskType::AutoRenewal,
                severity: Severity::High,
                title: "Silent renewal".to_string(),
                description: "Renews for 12 months unless cancelled 90 days prior.".to_string(),
                clause_text: Some("This Agreement shall automatically renew...".to_string()),
                suggestion: None,
            }],
            clause_explanations: vec![ClauseExplanation {
                clause_title: "Term".to_string(),
                clause_text: "The term is 24 months.".to_string(),
                explanation: "The contract lasts two years.".to_string(),
                importance: Importance::Important,
            }],
            financial_details: Some(FinancialDetails {
                total_value: Some("$120,000".to_string()),
                currency: Some("USD".to_string()),
                payment_amounts: vec![PaymentAmount {
                    amount: "$5,000".to_string(),
                    schedule: "monthly".to_string(),
                    due_date: None,
                }],
            }),
            dates: Some(ContractDates {
                start_date: Some("2024-01-01".to_string()),
                ..Default::default()
            }),
            legal_info: None,
            contract_metadata: Some(ContractMetadata {
                contract_type: Some("MSA".to_string()),
                category: None,
                signatories: vec![Signatory {
                    name: "Jane Roe".to_string(),
                    title: Some("CEO".to_string()),
                    role: None,
                    party: "Acme Corp".to_string(),
                }],
            }),
            structured_terms: Some(StructuredTerms {
                renewal: Some(RenewalTerms {
                    auto_renewal: Some("yes".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            metadata: AnalysisMetadata {
                total_clauses: 1,
                analyzed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                model: "contract-analyzer-v1".to_string(),
            },
        }
    }

    #[test]
    fn risk_type_labels_are_lenient() {
        assert_eq!(RiskType::from_label("auto-renewal"), RiskType::AutoRenewal);
        assert_eq!(RiskType::from_label("Auto Renewal"), RiskType::AutoRenewal);
        assert_eq!(RiskType::from_label("NON_COMPETE"), RiskType::NonCompete);
        assert_eq!(RiskType::from_label("indemnity"), RiskType::Other);
        assert_eq!(RiskType::from_label(""), RiskType::Other);
    }

    #[test]
    fn unknown_severity_and_importance_fall_back_to_defaults() {
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("catastrophic"), Severity::Low);
        assert_eq!(Importance::from_label("Critical"), Importance::Critical);
        assert_eq!(Importance::from_label("meh"), Importance::Standard);
    }

    #[test]
    fn enum_display_matches_wire_format() {
        for risk_type in [
            RiskType::NonCompete,
            RiskType::AutoRenewal,
            RiskType::Termination,
            RiskType::Liability,
            RiskType::Payment,
            RiskType::Other,
        ] {
            let wire = serde_json::to_value(risk_type).unwrap();
            assert_eq!(wire, serde_json::Value::String(risk_type.to_string()));
        }
    }

    #[test]
    fn analysis_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(sample_analysis()).unwrap();

        assert!(value.get("riskFlags").is_some());
        assert!(value.get("clauseExplanations").is_some());
        assert_eq!(value["riskFlags"][0]["type"], "auto-renewal");
        assert_eq!(value["riskFlags"][0]["clauseText"], "This Agreement shall automatically renew...");
        assert_eq!(value["metadata"]["totalClauses"], 1);
        assert!(value.get("legalInfo").is_none());
    }

    #[test]
    fn analysis_survives_json_round_trip() {
        let analysis = sample_analysis();
        let json = serde_json::to_string(&analysis).unwrap();
        let back: ContractAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back, analysis);
    }

    #[test]
    fn severity_counts_cover_every_flag() {
        let mut analysis = sample_analysis();
        analysis.risk_flags.push(RiskFlag {
            id: "risk-2".to_string(),
            risk_type: RiskType::Payment,
            severity: Severity::Low,
            title: "Late fee".to_string(),
            description: "1.5% monthly".to_string(),
            clause_text: None,
            suggestion: None,
        });

        let counts = analysis.severity_counts();
        assert_eq!(counts, SeverityCounts { high: 1, medium: 0, low: 1 });
        assert_eq!(counts.total(), analysis.risk_flags.len());
        assert!(analysis.has_high_risk());
    }
}
