//! Contribution validation errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the contribution recorder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContributionError {
    /// Amount is zero, negative or malformed.
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Amount is below the configured minimum.
    #[error("amount {amount} is below the minimum of {minimum}")]
    BelowMinimum {
        /// Supplied amount.
        amount: Decimal,
        /// Configured minimum.
        minimum: Decimal,
    },

    /// Contribution date lies in the future.
    #[error("contribution date {0} is in the future")]
    FutureDate(NaiveDate),

    /// The paying member is not an active member of the group.
    #[error("member is not active in this group")]
    MemberNotActive,

    /// A repayment contribution did not reference a loan.
    #[error("repayment contributions must reference a loan")]
    MissingLoanReference,

    /// The referenced loan belongs to another member or group.
    #[error("referenced loan does not belong to this member and group")]
    LoanMismatch,

    /// The referenced loan cannot accept repayments.
    #[error("referenced loan is not open for repayment")]
    LoanNotRepayable,

    /// Only pending contributions may be modified.
    #[error("only pending contributions can be modified")]
    NotPending,
}
