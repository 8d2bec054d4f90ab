//! Contribution recorder.
//!
//! Pure validation of contribution writes. The caller (repository
//! layer) resolves the membership and loan rows and passes the facts in
//! here; this module decides whether the write is allowed.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::contribution::error::ContributionError;
use crate::contribution::types::{ContributionStatus, ContributionType};

/// A contribution as submitted, before persistence.
#[derive(Debug, Clone, Copy)]
pub struct NewContribution {
    /// Kind of contribution.
    pub contribution_type: ContributionType,
    /// Amount in FBU.
    pub amount: Decimal,
    /// Date the money changed hands.
    pub contribution_date: NaiveDate,
}

/// Facts about the loan a repayment contribution points at.
#[derive(Debug, Clone, Copy)]
pub struct RepaymentTarget {
    /// The loan belongs to the paying member.
    pub belongs_to_member: bool,
    /// The loan belongs to the same group.
    pub belongs_to_group: bool,
    /// The loan is in a state that accepts repayments.
    pub is_repayable: bool,
}

/// Validation rules for recording and mutating contributions.
#[derive(Debug, Clone, Copy)]
pub struct ContributionService {
    /// Minimum accepted contribution amount.
    pub min_amount: Decimal,
}

impl ContributionService {
    /// Creates a recorder with the configured minimum amount.
    #[must_use]
    pub const fn new(min_amount: Decimal) -> Self {
        Self { min_amount }
    }

    /// Validates a new contribution.
    ///
    /// `today` is injected so the future-date rule is testable.
    /// `repayment_target` must be `Some` when the contribution type is
    /// a repayment and carries the resolved loan facts.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found.
    pub fn validate_new(
        &self,
        contribution: &NewContribution,
        member_is_active: bool,
        today: NaiveDate,
        repayment_target: Option<RepaymentTarget>,
    ) -> Result<(), ContributionError> {
        self.validate_amount(contribution.amount)?;

        if contribution.contribution_date > today {
            return Err(ContributionError::FutureDate(
                contribution.contribution_date,
            ));
        }
        if !member_is_active {
            return Err(ContributionError::MemberNotActive);
        }
        if contribution.contribution_type.requires_loan() {
            let target = repayment_target.ok_or(ContributionError::MissingLoanReference)?;
            if !target.belongs_to_member || !target.belongs_to_group {
                return Err(ContributionError::LoanMismatch);
            }
            if !target.is_repayable {
                return Err(ContributionError::LoanNotRepayable);
            }
        }
        Ok(())
    }

    /// Validates an amount on its own (used by updates).
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive values and
    /// `BelowMinimum` for values under the configured floor.
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), ContributionError> {
        if amount <= Decimal::ZERO {
            return Err(ContributionError::InvalidAmount(amount));
        }
        if amount < self.min_amount {
            return Err(ContributionError::BelowMinimum {
                amount,
                minimum: self.min_amount,
            });
        }
        Ok(())
    }

    /// Checks that a contribution may still be modified or deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotPending` once the contribution has been validated or
    /// cancelled.
    pub fn ensure_mutable(&self, status: ContributionStatus) -> Result<(), ContributionError> {
        if status == ContributionStatus::Pending {
            Ok(())
        } else {
            Err(ContributionError::NotPending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn service() -> ContributionService {
        ContributionService::new(dec!(100))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    fn savings(amount: Decimal) -> NewContribution {
        NewContribution {
            contribution_type: ContributionType::Savings,
            amount,
            contribution_date: today(),
        }
    }

    #[test]
    fn test_valid_savings_passes() {
        let result = service().validate_new(&savings(dec!(5000)), true, today(), None);
        assert!(result.is_ok());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-500))]
    fn test_non_positive_amount_rejected(#[case] amount: Decimal) {
        let result = service().validate_new(&savings(amount), true, today(), None);
        assert_eq!(result, Err(ContributionError::InvalidAmount(amount)));
    }

    #[test]
    fn test_below_minimum_rejected() {
        let result = service().validate_new(&savings(dec!(50)), true, today(), None);
        assert_eq!(
            result,
            Err(ContributionError::BelowMinimum {
                amount: dec!(50),
                minimum: dec!(100),
            })
        );
    }

    #[test]
    fn test_minimum_exactly_passes() {
        assert!(service()
            .validate_new(&savings(dec!(100)), true, today(), None)
            .is_ok());
    }

    #[test]
    fn test_future_date_rejected() {
        let tomorrow = today().succ_opt().unwrap();
        let contribution = NewContribution {
            contribution_date: tomorrow,
            ..savings(dec!(1000))
        };
        let result = service().validate_new(&contribution, true, today(), None);
        assert_eq!(result, Err(ContributionError::FutureDate(tomorrow)));
    }

    #[test]
    fn test_inactive_member_rejected() {
        let result = service().validate_new(&savings(dec!(1000)), false, today(), None);
        assert_eq!(result, Err(ContributionError::MemberNotActive));
    }

    #[test]
    fn test_repayment_without_loan_rejected() {
        let contribution = NewContribution {
            contribution_type: ContributionType::Repayment,
            ..savings(dec!(1000))
        };
        let result = service().validate_new(&contribution, true, today(), None);
        assert_eq!(result, Err(ContributionError::MissingLoanReference));
    }

    #[test]
    fn test_repayment_against_foreign_loan_rejected() {
        let contribution = NewContribution {
            contribution_type: ContributionType::Repayment,
            ..savings(dec!(1000))
        };
        let target = RepaymentTarget {
            belongs_to_member: false,
            belongs_to_group: true,
            is_repayable: true,
        };
        let result = service().validate_new(&contribution, true, today(), Some(target));
        assert_eq!(result, Err(ContributionError::LoanMismatch));
    }

    #[test]
    fn test_repayment_against_closed_loan_rejected() {
        let contribution = NewContribution {
            contribution_type: ContributionType::Repayment,
            ..savings(dec!(1000))
        };
        let target = RepaymentTarget {
            belongs_to_member: true,
            belongs_to_group: true,
            is_repayable: false,
        };
        let result = service().validate_new(&contribution, true, today(), Some(target));
        assert_eq!(result, Err(ContributionError::LoanNotRepayable));
    }

    #[rstest]
    #[case(ContributionStatus::Pending, true)]
    #[case(ContributionStatus::Validated, false)]
    #[case(ContributionStatus::Cancelled, false)]
    fn test_only_pending_is_mutable(#[case] status: ContributionStatus, #[case] mutable: bool) {
        assert_eq!(service().ensure_mutable(status).is_ok(), mutable);
    }
}
