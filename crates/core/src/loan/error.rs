//! Loan validation errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::loan::types::LoanStatus;

/// Errors raised by the loan lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    /// Principal is zero, negative or malformed.
    #[error("principal must be positive, got {0}")]
    InvalidPrincipal(Decimal),

    /// Principal is below the configured minimum.
    #[error("principal {amount} is below the minimum of {minimum}")]
    BelowMinimum {
        /// Requested principal.
        amount: Decimal,
        /// Configured minimum.
        minimum: Decimal,
    },

    /// Term is outside the allowed range.
    #[error("term of {term} months is outside 1..={max}")]
    InvalidTerm {
        /// Requested term in months.
        term: u32,
        /// Configured maximum term.
        max: u32,
    },

    /// Interest rate is outside 0..=100.
    #[error("interest rate {0} is outside 0..=100")]
    InvalidRate(Decimal),

    /// Borrower is not an active member of the group.
    #[error("borrower is not an active member of this group")]
    BorrowerNotActive,

    /// Borrower already has an outstanding loan in the group.
    #[error("borrower already has an outstanding loan in this group")]
    OutstandingLoanExists,

    /// The group cannot cover the requested principal.
    #[error("requested {requested} exceeds available loan funds {available}")]
    InsufficientFunds {
        /// Requested principal.
        requested: Decimal,
        /// Funds the group can still lend.
        available: Decimal,
    },

    /// The attempted status transition is not allowed.
    #[error("cannot transition loan from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status.
        from: LoanStatus,
        /// Attempted status.
        to: LoanStatus,
    },

    /// A rejection was submitted without a reason.
    #[error("a rejection reason is required")]
    MissingRejectionReason,

    /// A repayment was attempted against a loan that cannot accept one.
    #[error("loan in status {0:?} cannot accept repayments")]
    NotRepayable(LoanStatus),

    /// Repayment amount is zero or negative.
    #[error("repayment amount must be positive, got {0}")]
    InvalidRepaymentAmount(Decimal),
}
