//! Loan lifecycle rules.
//!
//! Pure decisions over facts the repository layer resolves inside its
//! transaction: membership status, outstanding loans, available funds,
//! current loan status. Nothing here touches the database.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::loan::amortization::Amortization;
use crate::loan::error::LoanError;
use crate::loan::types::LoanStatus;

/// A loan request as submitted.
#[derive(Debug, Clone, Copy)]
pub struct LoanRequest {
    /// Principal asked for.
    pub principal: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// Annual interest rate to capture, usually the group's current
    /// rate.
    pub annual_rate: Decimal,
}

/// Result of applying one repayment to a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentOutcome {
    /// Amount actually applied; never exceeds what was outstanding.
    pub applied: Decimal,
    /// Total repaid after this payment.
    pub amount_repaid: Decimal,
    /// Amount still outstanding after this payment.
    pub remaining: Decimal,
    /// Status the loan moves to.
    pub next_status: LoanStatus,
}

/// Validation rules for the loan lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct LoanService {
    /// Minimum principal a member may request.
    pub min_principal: Decimal,
    /// Maximum term in months.
    pub max_term_months: u32,
}

impl LoanService {
    /// Creates the rule set from configured limits.
    #[must_use]
    pub const fn new(min_principal: Decimal, max_term_months: u32) -> Self {
        Self {
            min_principal,
            max_term_months,
        }
    }

    /// Validates a loan request and computes its financials.
    ///
    /// `available_funds` must be the group's lendable funds as resolved
    /// inside the caller's transaction, with other pending requests
    /// already reserved.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation: inactive borrower, an existing
    /// outstanding loan, out-of-range principal/term/rate, or
    /// `InsufficientFunds`.
    pub fn validate_request(
        &self,
        request: &LoanRequest,
        borrower_is_active: bool,
        has_outstanding_loan: bool,
        available_funds: Decimal,
        today: NaiveDate,
    ) -> Result<Amortization, LoanError> {
        if !borrower_is_active {
            return Err(LoanError::BorrowerNotActive);
        }
        if has_outstanding_loan {
            return Err(LoanError::OutstandingLoanExists);
        }
        if request.principal <= Decimal::ZERO {
            return Err(LoanError::InvalidPrincipal(request.principal));
        }
        if request.principal < self.min_principal {
            return Err(LoanError::BelowMinimum {
                amount: request.principal,
                minimum: self.min_principal,
            });
        }
        if request.principal > available_funds {
            return Err(LoanError::InsufficientFunds {
                requested: request.principal,
                available: available_funds,
            });
        }
        Amortization::compute(
            request.principal,
            request.annual_rate,
            request.term_months,
            self.max_term_months,
            today,
        )
    }

    /// Validates an approval of a pending loan.
    ///
    /// Funds are re-checked here because the approval runs in a later
    /// transaction than the request did.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the loan is pending and
    /// `InsufficientFunds` when the group can no longer cover the
    /// principal.
    pub fn validate_approval(
        &self,
        status: LoanStatus,
        principal: Decimal,
        available_funds: Decimal,
    ) -> Result<(), LoanError> {
        if !status.can_transition_to(LoanStatus::Approved) {
            return Err(LoanError::InvalidTransition {
                from: status,
                to: LoanStatus::Approved,
            });
        }
        if principal > available_funds {
            return Err(LoanError::InsufficientFunds {
                requested: principal,
                available: available_funds,
            });
        }
        Ok(())
    }

    /// Validates a rejection of a pending loan.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the loan is pending and
    /// `MissingRejectionReason` when the reason is blank.
    pub fn validate_rejection(
        &self,
        status: LoanStatus,
        reason: &str,
    ) -> Result<(), LoanError> {
        if !status.can_transition_to(LoanStatus::Rejected) {
            return Err(LoanError::InvalidTransition {
                from: status,
                to: LoanStatus::Rejected,
            });
        }
        if reason.trim().is_empty() {
            return Err(LoanError::MissingRejectionReason);
        }
        Ok(())
    }

    /// Applies a repayment to a loan.
    ///
    /// The applied amount is clamped to what is still outstanding, so
    /// overpaying the final installment settles the loan exactly.
    ///
    /// # Errors
    ///
    /// Returns `NotRepayable` for loans outside `approved`/`active` and
    /// `InvalidRepaymentAmount` for non-positive amounts.
    pub fn apply_repayment(
        &self,
        status: LoanStatus,
        total_payable: Decimal,
        amount_repaid: Decimal,
        payment: Decimal,
    ) -> Result<RepaymentOutcome, LoanError> {
        if !status.is_repayable() {
            return Err(LoanError::NotRepayable(status));
        }
        if payment <= Decimal::ZERO {
            return Err(LoanError::InvalidRepaymentAmount(payment));
        }

        let outstanding = total_payable - amount_repaid;
        let applied = payment.min(outstanding);
        let new_repaid = amount_repaid + applied;
        let remaining = total_payable - new_repaid;

        let next_status = if remaining == Decimal::ZERO {
            LoanStatus::Repaid
        } else {
            LoanStatus::Active
        };

        Ok(RepaymentOutcome {
            applied,
            amount_repaid: new_repaid,
            remaining,
            next_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn service() -> LoanService {
        LoanService::new(dec!(5000), 12)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    fn request(principal: Decimal) -> LoanRequest {
        LoanRequest {
            principal,
            term_months: 12,
            annual_rate: dec!(10),
        }
    }

    #[test]
    fn test_valid_request_computes_financials() {
        let amortization = service()
            .validate_request(&request(dec!(50_000)), true, false, dec!(100_000), today())
            .unwrap();
        assert_eq!(amortization.total_payable, dec!(55_000.00));
    }

    #[test]
    fn test_inactive_borrower_rejected() {
        let result =
            service().validate_request(&request(dec!(50_000)), false, false, dec!(100_000), today());
        assert_eq!(result.unwrap_err(), LoanError::BorrowerNotActive);
    }

    #[test]
    fn test_outstanding_loan_blocks_request() {
        let result =
            service().validate_request(&request(dec!(50_000)), true, true, dec!(100_000), today());
        assert_eq!(result.unwrap_err(), LoanError::OutstandingLoanExists);
    }

    #[test]
    fn test_below_minimum_principal_rejected() {
        let result =
            service().validate_request(&request(dec!(4999)), true, false, dec!(100_000), today());
        assert_eq!(
            result.unwrap_err(),
            LoanError::BelowMinimum {
                amount: dec!(4999),
                minimum: dec!(5000),
            }
        );
    }

    #[test]
    fn test_request_over_available_funds_rejected() {
        let result =
            service().validate_request(&request(dec!(50_000)), true, false, dec!(49_999), today());
        assert_eq!(
            result.unwrap_err(),
            LoanError::InsufficientFunds {
                requested: dec!(50_000),
                available: dec!(49_999),
            }
        );
    }

    #[test]
    fn test_request_for_exactly_available_funds_passes() {
        let result =
            service().validate_request(&request(dec!(50_000)), true, false, dec!(50_000), today());
        assert!(result.is_ok());
    }

    #[test]
    fn test_approval_only_from_pending() {
        let service = service();
        assert!(service
            .validate_approval(LoanStatus::Pending, dec!(50_000), dec!(60_000))
            .is_ok());
        for status in [
            LoanStatus::Approved,
            LoanStatus::Rejected,
            LoanStatus::Active,
            LoanStatus::Repaid,
        ] {
            let result = service.validate_approval(status, dec!(50_000), dec!(60_000));
            assert_eq!(
                result.unwrap_err(),
                LoanError::InvalidTransition {
                    from: status,
                    to: LoanStatus::Approved,
                }
            );
        }
    }

    #[test]
    fn test_approval_rechecks_funds() {
        let result = service().validate_approval(LoanStatus::Pending, dec!(50_000), dec!(40_000));
        assert_eq!(
            result.unwrap_err(),
            LoanError::InsufficientFunds {
                requested: dec!(50_000),
                available: dec!(40_000),
            }
        );
    }

    #[test]
    fn test_rejection_requires_reason() {
        let service = service();
        assert!(service
            .validate_rejection(LoanStatus::Pending, "income not verified")
            .is_ok());
        assert_eq!(
            service.validate_rejection(LoanStatus::Pending, "   "),
            Err(LoanError::MissingRejectionReason)
        );
        assert_eq!(
            service.validate_rejection(LoanStatus::Active, "late"),
            Err(LoanError::InvalidTransition {
                from: LoanStatus::Active,
                to: LoanStatus::Rejected,
            })
        );
    }

    #[test]
    fn test_partial_repayment_moves_to_active() {
        let outcome = service()
            .apply_repayment(LoanStatus::Approved, dec!(55_000), Decimal::ZERO, dec!(10_000))
            .unwrap();
        assert_eq!(outcome.applied, dec!(10_000));
        assert_eq!(outcome.amount_repaid, dec!(10_000));
        assert_eq!(outcome.remaining, dec!(45_000));
        assert_eq!(outcome.next_status, LoanStatus::Active);
    }

    #[test]
    fn test_exact_final_repayment_settles_loan() {
        let outcome = service()
            .apply_repayment(LoanStatus::Active, dec!(55_000), dec!(50_000), dec!(5000))
            .unwrap();
        assert_eq!(outcome.applied, dec!(5000));
        assert_eq!(outcome.remaining, Decimal::ZERO);
        assert_eq!(outcome.next_status, LoanStatus::Repaid);
    }

    #[test]
    fn test_overpayment_is_clamped() {
        let outcome = service()
            .apply_repayment(LoanStatus::Active, dec!(55_000), dec!(54_000), dec!(2500))
            .unwrap();
        assert_eq!(outcome.applied, dec!(1000));
        assert_eq!(outcome.amount_repaid, dec!(55_000));
        assert_eq!(outcome.next_status, LoanStatus::Repaid);
    }

    #[test]
    fn test_repayment_on_closed_loan_rejected() {
        for status in [LoanStatus::Pending, LoanStatus::Rejected, LoanStatus::Repaid] {
            let result =
                service().apply_repayment(status, dec!(55_000), Decimal::ZERO, dec!(1000));
            assert_eq!(result.unwrap_err(), LoanError::NotRepayable(status));
        }
    }

    #[test]
    fn test_non_positive_repayment_rejected() {
        let result =
            service().apply_repayment(LoanStatus::Active, dec!(55_000), dec!(1000), Decimal::ZERO);
        assert_eq!(
            result.unwrap_err(),
            LoanError::InvalidRepaymentAmount(Decimal::ZERO)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// Repayments never push `amount_repaid` past the total and the
        /// loan settles exactly when the remaining hits zero.
        #[test]
        fn prop_repayments_never_overshoot(
            total_cents in 1i64..1_000_000_000,
            payments in prop::collection::vec(1i64..100_000_000, 1..30),
        ) {
            let svc = service();
            let total = Decimal::new(total_cents, 2);
            let mut repaid = Decimal::ZERO;
            let mut status = LoanStatus::Approved;

            for cents in payments {
                if !status.is_repayable() {
                    break;
                }
                let outcome = svc
                    .apply_repayment(status, total, repaid, Decimal::new(cents, 2))
                    .unwrap();
                prop_assert!(outcome.amount_repaid <= total);
                prop_assert!(outcome.applied > Decimal::ZERO);
                prop_assert_eq!(outcome.remaining, total - outcome.amount_repaid);
                repaid = outcome.amount_repaid;
                status = outcome.next_status;
            }

            if repaid == total {
                prop_assert_eq!(status, LoanStatus::Repaid);
            } else {
                prop_assert_eq!(status, LoanStatus::Active);
            }
        }
    }
}
