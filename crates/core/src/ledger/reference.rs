//! Ledger reference generation.
//!
//! References look like `PRT-20260825-1A2B3C`: kind prefix, date, and a
//! six-character suffix drawn from a fresh UUID. Uniqueness is enforced
//! by the database; the suffix only makes collisions improbable within
//! a day.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::ledger::types::TransactionKind;

/// Length of the random suffix.
const SUFFIX_LEN: usize = 6;

/// Generates a ledger reference for a transaction of the given kind.
#[must_use]
pub fn generate_reference(kind: TransactionKind, date: NaiveDate) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SUFFIX_LEN)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    format!(
        "{}-{}-{}",
        kind.reference_prefix(),
        date.format("%Y%m%d"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    #[test]
    fn test_reference_shape() {
        let reference = generate_reference(TransactionKind::LoanDisbursement, date());
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PRT");
        assert_eq!(parts[1], "20260825");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_references_are_distinct() {
        let references: HashSet<String> = (0..200)
            .map(|_| generate_reference(TransactionKind::ContributionSavings, date()))
            .collect();
        assert_eq!(references.len(), 200);
    }
}
