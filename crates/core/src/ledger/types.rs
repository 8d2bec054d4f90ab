//! Closed enumerations for ledger transactions.

use serde::{Deserialize, Serialize};

use crate::contribution::types::{ContributionType, PaymentMethod};

/// Kind of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Savings contribution received.
    ContributionSavings,
    /// Penalty received.
    ContributionPenalty,
    /// Interest received outside a loan repayment.
    ContributionInterest,
    /// Fee received.
    ContributionFee,
    /// Withdrawal paid out to a member.
    Withdrawal,
    /// Loan principal paid out to a borrower.
    LoanDisbursement,
    /// Loan repayment received.
    LoanRepayment,
}

impl TransactionKind {
    /// Reference prefix for this kind of transaction.
    #[must_use]
    pub const fn reference_prefix(self) -> &'static str {
        match self {
            Self::ContributionSavings => "EPG",
            Self::ContributionPenalty => "PEN",
            Self::ContributionInterest => "INT",
            Self::ContributionFee => "FRS",
            Self::Withdrawal => "RTR",
            Self::LoanDisbursement => "PRT",
            Self::LoanRepayment => "RMB",
        }
    }

    /// Maps a contribution type to the ledger kind it produces.
    #[must_use]
    pub const fn from_contribution(contribution_type: ContributionType) -> Self {
        match contribution_type {
            ContributionType::Savings => Self::ContributionSavings,
            ContributionType::Penalty => Self::ContributionPenalty,
            ContributionType::Repayment => Self::LoanRepayment,
            ContributionType::Interest => Self::ContributionInterest,
            ContributionType::Fee => Self::ContributionFee,
            ContributionType::Withdrawal => Self::Withdrawal,
        }
    }
}

/// Where the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Lumicash mobile money.
    Lumicash,
    /// EcoCash mobile money.
    Ecocash,
    /// M-Pesa mobile money.
    Mpesa,
    /// Cash at a meeting.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Internal bookkeeping (disbursements, corrections).
    Internal,
}

impl From<PaymentMethod> for TransactionSource {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Lumicash => Self::Lumicash,
            PaymentMethod::Ecocash => Self::Ecocash,
            PaymentMethod::Mpesa => Self::Mpesa,
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::BankTransfer => Self::BankTransfer,
        }
    }
}

/// Settlement status of a ledger transaction.
///
/// Internal movements are recorded as `Completed`; mobile-money
/// movements start `Pending` and are resolved by the payment callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Settled.
    Completed,
    /// Awaiting payment-channel confirmation.
    Pending,
    /// The payment channel reported failure.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TransactionKind::ContributionSavings, "EPG")]
    #[case(TransactionKind::ContributionPenalty, "PEN")]
    #[case(TransactionKind::ContributionInterest, "INT")]
    #[case(TransactionKind::ContributionFee, "FRS")]
    #[case(TransactionKind::Withdrawal, "RTR")]
    #[case(TransactionKind::LoanDisbursement, "PRT")]
    #[case(TransactionKind::LoanRepayment, "RMB")]
    fn test_reference_prefixes(#[case] kind: TransactionKind, #[case] prefix: &str) {
        assert_eq!(kind.reference_prefix(), prefix);
    }

    #[test]
    fn test_contribution_kind_mapping() {
        assert_eq!(
            TransactionKind::from_contribution(ContributionType::Savings),
            TransactionKind::ContributionSavings
        );
        assert_eq!(
            TransactionKind::from_contribution(ContributionType::Repayment),
            TransactionKind::LoanRepayment
        );
        assert_eq!(
            TransactionKind::from_contribution(ContributionType::Withdrawal),
            TransactionKind::Withdrawal
        );
    }

    #[test]
    fn test_payment_method_source_mapping() {
        assert_eq!(
            TransactionSource::from(PaymentMethod::Lumicash),
            TransactionSource::Lumicash
        );
        assert_eq!(
            TransactionSource::from(PaymentMethod::Cash),
            TransactionSource::Cash
        );
    }
}
