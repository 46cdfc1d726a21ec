//! Untyped AI output -> [`ContractAnalysis`].
//!
//! Only a missing summary (or a non-object payload) is fatal. Everything else
//! is validated field by field: a malformed sub-object is treated as absent,
//! and a risk flag or clause explanation missing its required text is dropped.
//! Keys are read in camelCase, falling back to their snake_case spelling.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use super::error::MalformedAnalysisError;
use crate::domain::analysis::{
    AnalysisMetadata, ClauseExplanation, ConfidentialityTerms, ContractAnalysis, ContractDates,
    ContractMetadata, FinancialDetails, Importance, IntellectualPropertyTerms, KeyParties,
    LegalInfo, PaymentAmount, RenewalTerms, RiskFlag, RiskType, Severity, Signatory,
    StructuredTerms, TerminationTerms,
};

type Object = Map<String, Value>;

/// Values the normalizer stamps when the payload does not carry them.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    pub analyzed_at: DateTime<Utc>,
    pub model: String,
}

impl NormalizeContext {
    pub fn new(analyzed_at: DateTime<Utc>, model: impl Into<String>) -> Self {
        Self {
            analyzed_at,
            model: model.into(),
        }
    }
}

/// Validate and coerce a raw analysis payload.
///
/// Deterministic for a given `raw` and `ctx`, and idempotent: feeding the
/// serialized output back in returns the same analysis.
pub fn normalize(
    raw: &Value,
    ctx: &NormalizeContext,
) -> Result<ContractAnalysis, MalformedAnalysisError> {
    let obj = raw.as_object().ok_or(MalformedAnalysisError::NotAnObject)?;
    let summary = field(obj, "summary").ok_or(MalformedAnalysisError::MissingSummary)?;

    let clause_explanations: Vec<ClauseExplanation> = entries(obj, "clauseExplanations")
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let clause = clause_explanation(value);
            if clause.is_none() {
                debug!(index, "Dropping clause explanation without explanation text");
            }
            clause
        })
        .collect();

    let metadata = metadata(
        object(obj, "metadata"),
        clause_explanations.len(),
        ctx,
    );

    Ok(ContractAnalysis {
        summary,
        key_parties: object(obj, "keyParties").and_then(key_parties),
        duration: field(obj, "duration"),
        payment_terms: field(obj, "paymentTerms"),
        obligations: entries(obj, "obligations")
            .iter()
            .filter_map(|value| text(value))
            .collect(),
        risk_flags: risk_flags(entries(obj, "riskFlags")),
        clause_explanations,
        financial_details: object(obj, "financialDetails").and_then(financial_details),
        dates: object(obj, "dates").and_then(dates),
        legal_info: object(obj, "legalInfo").and_then(legal_info),
        contract_metadata: object(obj, "contractMetadata").and_then(contract_metadata),
        structured_terms: object(obj, "structuredTerms").and_then(structured_terms),
        metadata,
    })
}

// =============================================================================
// Field access
// =============================================================================

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn lookup<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
    obj.get(key).or_else(|| obj.get(&snake_case(key)))
}

/// Trimmed, non-empty text. Numbers are accepted in their JSON form.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field(obj: &Object, key: &str) -> Option<String> {
    lookup(obj, key).and_then(text)
}

/// Untrimmed text for excerpts that must be stored verbatim.
fn verbatim(obj: &Object, key: &str) -> Option<String> {
    match lookup(obj, key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn label<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    lookup(obj, key).and_then(Value::as_str)
}

/// A nested object; anything else (including a wrong type) is absent.
fn object<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    match lookup(obj, key)? {
        Value::Object(map) => Some(map),
        Value::Null => None,
        _ => {
            debug!(field = key, "Dropping malformed sub-object");
            None
        }
    }
}

fn entries<'a>(obj: &'a Object, key: &str) -> &'a [Value] {
    match lookup(obj, key) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// `None` for a record with nothing in it, so an empty object reads as absent.
fn non_empty<T: Default + PartialEq>(record: T) -> Option<T> {
    (record != T::default()).then_some(record)
}

// =============================================================================
// Risk flags and clauses
// =============================================================================

fn risk_flag(value: &Value) -> Option<(Option<String>, RiskFlag)> {
    let obj = value.as_object()?;
    let title = field(obj, "title")?;
    let description = field(obj, "description")?;

    let flag = RiskFlag {
        id: String::new(),
        risk_type: label(obj, "type")
            .map(RiskType::from_label)
            .unwrap_or_default(),
        severity: label(obj, "severity")
            .map(Severity::from_label)
            .unwrap_or_default(),
        title,
        description,
        clause_text: verbatim(obj, "clauseText"),
        suggestion: field(obj, "suggestion"),
    };
    Some((field(obj, "id"), flag))
}

/// Valid flags in input order. The first holder of an upstream id keeps it;
/// missing or duplicate ids become `risk-<n>`, skipping ids already in use.
fn risk_flags(values: &[Value]) -> Vec<RiskFlag> {
    let candidates: Vec<(Option<String>, RiskFlag)> = values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let flag = risk_flag(value);
            if flag.is_none() {
                debug!(index, "Dropping risk flag without title or description");
            }
            flag
        })
        .collect();

    let mut taken = HashSet::new();
    let keeps: Vec<bool> = candidates
        .iter()
        .map(|(id, _)| id.as_ref().map_or(false, |id| taken.insert(id.clone())))
        .collect();

    let mut next = 0usize;
    candidates
        .into_iter()
        .zip(keeps)
        .map(|((id, mut flag), keep)| {
            flag.id = match id {
                Some(id) if keep => id,
                _ => loop {
                    next += 1;
                    let candidate = format!("risk-{next}");
                    if taken.insert(candidate.clone()) {
                        break candidate;
                    }
                },
            };
            flag
        })
        .collect()
}

fn clause_explanation(value: &Value) -> Option<ClauseExplanation> {
    let obj = value.as_object()?;
    Some(ClauseExplanation {
        explanation: field(obj, "explanation")?,
        clause_title: field(obj, "clauseTitle").unwrap_or_default(),
        clause_text: verbatim(obj, "clauseText").unwrap_or_default(),
        importance: label(obj, "importance")
            .map(Importance::from_label)
            .unwrap_or_default(),
    })
}

// =============================================================================
// Extended metadata
// =============================================================================

fn key_parties(obj: &Object) -> Option<KeyParties> {
    Some(KeyParties {
        party1: field(obj, "party1")?,
        party2: field(obj, "party2")?,
    })
}

fn payment_amount(value: &Value) -> Option<PaymentAmount> {
    let obj = value.as_object()?;
    Some(PaymentAmount {
        amount: field(obj, "amount")?,
        schedule: field(obj, "schedule")?,
        due_date: field(obj, "dueDate"),
    })
}

fn financial_details(obj: &Object) -> Option<FinancialDetails> {
    non_empty(FinancialDetails {
        total_value: field(obj, "totalValue"),
        currency: field(obj, "currency"),
        payment_amounts: entries(obj, "paymentAmounts")
            .iter()
            .filter_map(payment_amount)
            .collect(),
    })
}

fn dates(obj: &Object) -> Option<ContractDates> {
    non_empty(ContractDates {
        start_date: field(obj, "startDate"),
        end_date: field(obj, "endDate"),
        signing_date: field(obj, "signingDate"),
        effective_date: field(obj, "effectiveDate"),
    })
}

fn legal_info(obj: &Object) -> Option<LegalInfo> {
    non_empty(LegalInfo {
        governing_law: field(obj, "governingLaw"),
        jurisdiction: field(obj, "jurisdiction"),
        dispute_resolution: field(obj, "disputeResolution"),
        venue: field(obj, "venue"),
    })
}

fn signatory(value: &Value) -> Option<Signatory> {
    let obj = value.as_object()?;
    Some(Signatory {
        name: field(obj, "name")?,
        title: field(obj, "title"),
        role: field(obj, "role"),
        party: field(obj, "party")?,
    })
}

fn contract_metadata(obj: &Object) -> Option<ContractMetadata> {
    non_empty(ContractMetadata {
        contract_type: field(obj, "contractType"),
        category: field(obj, "category"),
        signatories: entries(obj, "signatories")
            .iter()
            .filter_map(signatory)
            .collect(),
    })
}

fn structured_terms(obj: &Object) -> Option<StructuredTerms> {
    let renewal = object(obj, "renewal").and_then(|o| {
        non_empty(RenewalTerms {
            auto_renewal: field(o, "autoRenewal"),
            renewal_period: field(o, "renewalPeriod"),
            notice_period: field(o, "noticePeriod"),
        })
    });
    let termination = object(obj, "termination").and_then(|o| {
        non_empty(TerminationTerms {
            notice_period: field(o, "noticePeriod"),
            for_cause: field(o, "forCause"),
            for_convenience: field(o, "forConvenience"),
        })
    });
    let intellectual_property = object(obj, "intellectualProperty").and_then(|o| {
        non_empty(IntellectualPropertyTerms {
            ownership: field(o, "ownership"),
            licensing: field(o, "licensing"),
            restrictions: field(o, "restrictions"),
        })
    });
    let confidentiality = object(obj, "confidentiality").and_then(|o| {
        non_empty(ConfidentialityTerms {
            duration: field(o, "duration"),
            scope: field(o, "scope"),
            exceptions: field(o, "exceptions"),
        })
    });

    non_empty(StructuredTerms {
        renewal,
        termination,
        intellectual_property,
        confidentiality,
    })
}

/// `total_clauses` always comes from the filtered clause list. An upstream
/// `analyzedAt` is kept only when it is valid RFC 3339.
fn metadata(raw: Option<&Object>, total_clauses: usize, ctx: &NormalizeContext) -> AnalysisMetadata {
    let analyzed_at = raw
        .and_then(|m| label(m, "analyzedAt"))
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(ctx.analyzed_at);
    let model = raw
        .and_then(|m| field(m, "model"))
        .unwrap_or_else(|| ctx.model.clone());

    AnalysisMetadata {
        total_clauses,
        analyzed_at,
        model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ctx() -> NormalizeContext {
        NormalizeContext::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            "contract-analyzer-v1",
        )
    }

    fn full_payload() -> Value {
        json!({
            "summary": "  Services agreement between Acme and Globex.  ",
            "keyParties": { "party1": "Acme Corp", "party2": "Globex LLC" },
            "duration": "24 months",
            "paymentTerms": "Net 30",
            "obligations": ["Deliver reports", "", 42, null, "Maintain insurance"],
            "riskFlags": [
                {
                    "id": "r-1",
                    "type": "auto_renewal",
                    "severity": "HIGH",
                    "title": "Silent renewal",
                    "description": "Renews unless cancelled 90 days prior.",
                    "clauseText": "  12.1 This Agreement renews automatically.  "
                },
                { "type": "indemnity", "title": "Broad indemnity", "description": "Uncapped." }
            ],
            "clauseExplanations": [
                { "clauseTitle": "Term", "clauseText": "24 months", "explanation": "Two years.", "importance": "critical" },
                { "clauseTitle": "Notices", "explanation": "Written notice required." }
            ],
            "financialDetails": {
                "totalValue": 120000,
                "currency": "USD",
                "paymentAmounts": [
                    { "amount": "$5,000", "schedule": "monthly", "dueDate": "1st of month" },
                    { "amount": "$1,000" }
                ]
            },
            "dates": { "startDate": "2024-01-01", "endDate": "2025-12-31" },
            "legalInfo": { "governingLaw": "Delaware", "venue": "" },
            "contractMetadata": {
                "contractType": "MSA",
                "signatories": [
                    { "name": "Jane Roe", "title": "CEO", "party": "Acme Corp" },
                    { "name": "Nobody" }
                ]
            },
            "structuredTerms": {
                "renewal": { "autoRenewal": "yes", "noticePeriod": "90 days" },
                "termination": "thirty days"
            },
            "metadata": { "totalClauses": 99, "model": "upstream-model" }
        })
    }

    #[test]
    fn empty_object_is_malformed() {
        assert_eq!(
            normalize(&json!({}), &ctx()),
            Err(MalformedAnalysisError::MissingSummary)
        );
    }

    #[test]
    fn blank_summary_is_malformed() {
        assert_eq!(
            normalize(&json!({ "summary": "   " }), &ctx()),
            Err(MalformedAnalysisError::MissingSummary)
        );
        assert_eq!(
            normalize(&json!({ "summary": ["not", "text"] }), &ctx()),
            Err(MalformedAnalysisError::MissingSummary)
        );
    }

    #[test]
    fn non_object_payload_is_malformed() {
        for raw in [json!(null), json!("summary"), json!([{ "summary": "x" }]), json!(3)] {
            assert_eq!(normalize(&raw, &ctx()), Err(MalformedAnalysisError::NotAnObject));
        }
    }

    #[test]
    fn minimal_payload_gets_defaults() {
        let analysis = normalize(&json!({ "summary": "Short NDA." }), &ctx()).unwrap();

        assert_eq!(analysis.summary, "Short NDA.");
        assert!(analysis.obligations.is_empty());
        assert!(analysis.risk_flags.is_empty());
        assert!(analysis.financial_details.is_none());
        assert_eq!(analysis.metadata.total_clauses, 0);
        assert_eq!(analysis.metadata.analyzed_at, ctx().analyzed_at);
        assert_eq!(analysis.metadata.model, "contract-analyzer-v1");
    }

    #[test]
    fn partial_drop_keeps_only_valid_flag() {
        let raw = json!({
            "summary": "Supply agreement.",
            "riskFlags": [
                { "type": "payment", "severity": "high", "title": "Late fee", "description": "1.5% per month on overdue invoices." },
                { "title": "", "description": "" }
            ]
        });

        let analysis = normalize(&raw, &ctx()).unwrap();
        assert_eq!(analysis.risk_flags.len(), 1);
        let flag = &analysis.risk_flags[0];
        assert_eq!(flag.title, "Late fee");
        assert_eq!(flag.risk_type, RiskType::Payment);
        assert_eq!(flag.severity, Severity::High);
    }

    #[test]
    fn enum_fields_are_total() {
        let raw = json!({
            "summary": "Lease.",
            "riskFlags": [
                { "title": "A", "description": "a", "type": null, "severity": null },
                { "title": "B", "description": "b", "type": 7, "severity": ["high"] },
                { "title": "C", "description": "c", "type": "gardening", "severity": "extreme" },
                { "title": "D", "description": "d" }
            ],
            "clauseExplanations": [
                { "explanation": "x", "importance": null },
                { "explanation": "y", "importance": 3 },
                { "explanation": "z", "importance": "vital" }
            ]
        });

        let analysis = normalize(&raw, &ctx()).unwrap();
        assert_eq!(analysis.risk_flags.len(), 4);
        for flag in &analysis.risk_flags {
            assert_eq!(flag.risk_type, RiskType::Other);
            assert_eq!(flag.severity, Severity::Low);
        }
        assert_eq!(analysis.clause_explanations.len(), 3);
        for clause in &analysis.clause_explanations {
            assert_eq!(clause.importance, Importance::Standard);
        }
    }

    #[test]
    fn total_clauses_ignores_upstream_claim() {
        let analysis = normalize(&full_payload(), &ctx()).unwrap();
        assert_eq!(analysis.clause_explanations.len(), 2);
        assert_eq!(analysis.metadata.total_clauses, 2);
        assert_eq!(analysis.metadata.model, "upstream-model");
    }

    #[test]
    fn clauses_without_explanation_are_dropped() {
        let raw = json!({
            "summary": "Employment agreement.",
            "clauseExplanations": [
                { "clauseTitle": "Non-compete", "clauseText": "12 months" },
                { "clauseTitle": "Salary", "explanation": "Paid monthly." },
                "not an object"
            ],
            "metadata": { "totalClauses": 3 }
        });

        let analysis = normalize(&raw, &ctx()).unwrap();
        assert_eq!(analysis.clause_explanations.len(), 1);
        assert_eq!(analysis.clause_explanations[0].clause_title, "Salary");
        assert_eq!(analysis.clause_explanations[0].clause_text, "");
        assert_eq!(analysis.metadata.total_clauses, 1);
    }

    #[test]
    fn full_payload_is_coerced_field_by_field() {
        let analysis = normalize(&full_payload(), &ctx()).unwrap();

        assert_eq!(analysis.summary, "Services agreement between Acme and Globex.");
        assert_eq!(
            analysis.obligations,
            vec!["Deliver reports", "42", "Maintain insurance"]
        );
        assert_eq!(analysis.key_parties.as_ref().unwrap().party2, "Globex LLC");

        let first = &analysis.risk_flags[0];
        assert_eq!(first.id, "r-1");
        assert_eq!(first.risk_type, RiskType::AutoRenewal);
        assert_eq!(
            first.clause_text.as_deref(),
            Some("  12.1 This Agreement renews automatically.  ")
        );
        assert_eq!(analysis.risk_flags[1].id, "risk-1");
        assert_eq!(analysis.risk_flags[1].risk_type, RiskType::Other);

        let financial = analysis.financial_details.as_ref().unwrap();
        assert_eq!(financial.total_value.as_deref(), Some("120000"));
        assert_eq!(financial.payment_amounts.len(), 1);

        assert_eq!(analysis.legal_info.as_ref().unwrap().venue, None);
        assert_eq!(analysis.contract_metadata.as_ref().unwrap().signatories.len(), 1);

        let terms = analysis.structured_terms.as_ref().unwrap();
        assert_eq!(
            terms.renewal.as_ref().unwrap().notice_period.as_deref(),
            Some("90 days")
        );
        assert!(terms.termination.is_none());
    }

    #[test]
    fn malformed_sub_objects_are_dropped_not_fatal() {
        let raw = json!({
            "summary": "Consulting agreement.",
            "keyParties": "Acme and Globex",
            "financialDetails": [1, 2, 3],
            "dates": 20240101,
            "legalInfo": {},
            "contractMetadata": null,
            "structuredTerms": { "renewal": {} }
        });

        let analysis = normalize(&raw, &ctx()).unwrap();
        assert!(analysis.key_parties.is_none());
        assert!(analysis.financial_details.is_none());
        assert!(analysis.dates.is_none());
        assert!(analysis.legal_info.is_none());
        assert!(analysis.contract_metadata.is_none());
        assert!(analysis.structured_terms.is_none());
    }

    #[test]
    fn incomplete_key_parties_are_absent() {
        let raw = json!({ "summary": "NDA.", "keyParties": { "party1": "Acme" } });
        assert!(normalize(&raw, &ctx()).unwrap().key_parties.is_none());
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let raw = json!({
            "summary": "Distribution agreement.",
            "risk_flags": [{ "title": "Exclusivity", "description": "Worldwide.", "severity": "medium" }],
            "clause_explanations": [{ "clause_title": "Territory", "explanation": "Worldwide." }],
            "legal_info": { "governing_law": "New York" }
        });

        let analysis = normalize(&raw, &ctx()).unwrap();
        assert_eq!(analysis.risk_flags[0].severity, Severity::Medium);
        assert_eq!(analysis.clause_explanations[0].clause_title, "Territory");
        assert_eq!(
            analysis.legal_info.unwrap().governing_law.as_deref(),
            Some("New York")
        );
    }

    #[test]
    fn duplicate_and_missing_ids_are_made_unique() {
        let raw = json!({
            "summary": "Reseller agreement.",
            "riskFlags": [
                { "title": "A", "description": "a" },
                { "id": "risk-1", "title": "B", "description": "b" },
                { "id": "risk-1", "title": "C", "description": "c" },
                { "id": 7, "title": "D", "description": "d" }
            ]
        });

        let ids: Vec<String> = normalize(&raw, &ctx())
            .unwrap()
            .risk_flags
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["risk-2", "risk-1", "risk-3", "7"]);
    }

    #[test]
    fn upstream_timestamp_is_kept_when_valid() {
        let raw = json!({
            "summary": "NDA.",
            "metadata": { "analyzedAt": "2024-02-03T04:05:06Z" }
        });
        let analysis = normalize(&raw, &ctx()).unwrap();
        assert_eq!(
            analysis.metadata.analyzed_at,
            Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap()
        );

        let raw = json!({ "summary": "NDA.", "metadata": { "analyzedAt": "yesterday" } });
        assert_eq!(normalize(&raw, &ctx()).unwrap().metadata.analyzed_at, ctx().analyzed_at);
    }

    #[test]
    fn output_is_deterministic() {
        let first = serde_json::to_string(&normalize(&full_payload(), &ctx()).unwrap()).unwrap();
        let second = serde_json::to_string(&normalize(&full_payload(), &ctx()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize(&full_payload(), &ctx()).unwrap();
        let reserialized = serde_json::to_value(&once).unwrap();

        let later = NormalizeContext::new(
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            "other-model",
        );
        let twice = normalize(&reserialized, &later).unwrap();
        assert_eq!(twice, once);
    }
}
