//! Cross-contract comparison.
//!
//! Aligns two or more analyzed contracts along risk, financial, date, legal
//! and terms dimensions. The engine only borrows the analyses; every row it
//! emits is an owned copy.

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use super::error::InsufficientContractsError;
use super::percentage;
use crate::domain::analysis::{ContractAnalysis, SeverityCounts};
use crate::domain::comparison::{
    ComparisonInsights, ComparisonResult, ContractHighlight, DateInsight, FinancialInsight,
    LegalInsight, RiskDifferences, RiskRollup, TermsInsight,
};
use crate::domain::contracts::Contract;

/// Fewest contracts a comparison accepts.
pub const MIN_CONTRACTS: usize = 2;

/// One analyzed contract, borrowed for the duration of a comparison.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonSubject<'a> {
    pub contract_id: Uuid,
    pub file_name: &'a str,
    pub analysis: &'a ContractAnalysis,
}

impl<'a> ComparisonSubject<'a> {
    /// `None` unless the contract has completed analysis.
    pub fn from_contract(contract: &'a Contract) -> Option<Self> {
        contract.completed_analysis().map(|analysis| Self {
            contract_id: contract.id,
            file_name: &contract.file_name,
            analysis,
        })
    }
}

/// Compare the given contracts. Output tables keep the input order.
pub fn compare(
    subjects: &[ComparisonSubject<'_>],
) -> Result<ComparisonResult, InsufficientContractsError> {
    if subjects.len() < MIN_CONTRACTS {
        return Err(InsufficientContractsError {
            required: MIN_CONTRACTS,
            found: subjects.len(),
        });
    }

    let counts: Vec<SeverityCounts> = subjects
        .iter()
        .map(|s| s.analysis.severity_counts())
        .collect();
    let differences = differences(&counts);
    let all_flags = differences.total_high_risks
        + differences.total_medium_risks
        + differences.total_low_risks;

    let contracts = subjects
        .iter()
        .zip(&counts)
        .map(|(subject, c)| RiskRollup {
            contract_id: subject.contract_id,
            file_name: subject.file_name.to_string(),
            high_risks: c.high,
            medium_risks: c.medium,
            low_risks: c.low,
            total_risks: c.total(),
            risk_share: percentage(c.total(), all_flags),
        })
        .collect();

    let insights = ComparisonInsights {
        financial: subjects.iter().map(financial_row).collect(),
        dates: subjects.iter().map(date_row).collect(),
        legal: subjects.iter().map(legal_row).collect(),
        terms: subjects.iter().map(terms_row).collect(),
    };

    let highest_value = insights
        .financial
        .iter()
        .filter_map(|row| row.parsed_total_value)
        .max();

    let highlights = subjects
        .iter()
        .zip(&counts)
        .zip(&insights.financial)
        .map(|((subject, c), financial)| ContractHighlight {
            contract_id: subject.contract_id,
            is_max_high: at_max(c.high, differences.max_high_risks),
            is_max_medium: at_max(c.medium, differences.max_medium_risks),
            is_max_low: at_max(c.low, differences.max_low_risks),
            is_highest_value: highest_value.is_some()
                && financial.parsed_total_value == highest_value,
        })
        .collect();

    Ok(ComparisonResult {
        contracts,
        insights,
        differences,
        highlights,
    })
}

fn differences(counts: &[SeverityCounts]) -> RiskDifferences {
    let mut diff = RiskDifferences::default();
    for c in counts {
        diff.total_high_risks += c.high;
        diff.total_medium_risks += c.medium;
        diff.total_low_risks += c.low;
        diff.max_high_risks = diff.max_high_risks.max(c.high);
        diff.max_medium_risks = diff.max_medium_risks.max(c.medium);
        diff.max_low_risks = diff.max_low_risks.max(c.low);
    }
    diff
}

/// Every contract tied at a non-zero maximum is highlighted.
fn at_max(count: usize, max: usize) -> bool {
    max > 0 && count == max
}

/// Read the first number out of a money string such as `"$120,000.00 USD"`.
pub(crate) fn parse_amount(text: &str) -> Option<Decimal> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    Decimal::from_str(digits.trim_end_matches('.')).ok()
}

fn financial_row(subject: &ComparisonSubject<'_>) -> FinancialInsight {
    let details = subject.analysis.financial_details.as_ref();
    let total_value = details.and_then(|d| d.total_value.clone());
    FinancialInsight {
        contract_id: subject.contract_id,
        file_name: subject.file_name.to_string(),
        parsed_total_value: total_value.as_deref().and_then(parse_amount),
        total_value,
        currency: details.and_then(|d| d.currency.clone()),
        payment_amounts: details
            .map(|d| d.payment_amounts.clone())
            .unwrap_or_default(),
    }
}

fn date_row(subject: &ComparisonSubject<'_>) -> DateInsight {
    let dates = subject.analysis.dates.as_ref();
    DateInsight {
        contract_id: subject.contract_id,
        file_name: subject.file_name.to_string(),
        start_date: dates.and_then(|d| d.start_date.clone()),
        end_date: dates.and_then(|d| d.end_date.clone()),
        duration: subject.analysis.duration.clone(),
    }
}

fn legal_row(subject: &ComparisonSubject<'_>) -> LegalInsight {
    let legal = subject.analysis.legal_info.as_ref();
    LegalInsight {
        contract_id: subject.contract_id,
        file_name: subject.file_name.to_string(),
        governing_law: legal.and_then(|l| l.governing_law.clone()),
        jurisdiction: legal.and_then(|l| l.jurisdiction.clone()),
        dispute_resolution: legal.and_then(|l| l.dispute_resolution.clone()),
    }
}

fn terms_row(subject: &ComparisonSubject<'_>) -> TermsInsight {
    TermsInsight {
        contract_id: subject.contract_id,
        file_name: subject.file_name.to_string(),
        terms: subject.analysis.structured_terms.clone().unwrap_or_default(),
    }
}
