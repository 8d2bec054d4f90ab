//! Postgres enum mappings.
//!
//! Each database enum mirrors a closed enum in `twungurane-core`; the
//! `From` impls keep the two in lockstep so repositories translate at
//! the boundary and core logic never sees a database type.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use twungurane_core::contribution::{ContributionStatus, ContributionType, PaymentMethod};
use twungurane_core::group::{Frequency, GroupStatus, GroupType, MemberRole, MemberStatus};
use twungurane_core::ledger::{TransactionKind, TransactionSource, TransactionStatus};
use twungurane_core::loan::LoanStatus;

/// Platform-level user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Ordinary platform user.
    #[sea_orm(string_value = "member")]
    Member,
}

/// Kind of savings group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "group_type")]
#[serde(rename_all = "snake_case")]
pub enum DbGroupType {
    /// Village Savings and Loan Association.
    #[sea_orm(string_value = "vsla")]
    Vsla,
    /// Rotating savings circle.
    #[sea_orm(string_value = "tontine")]
    Tontine,
    /// Solidarity group.
    #[sea_orm(string_value = "solidarity")]
    Solidarity,
}

/// Lifecycle status of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "group_status")]
#[serde(rename_all = "snake_case")]
pub enum DbGroupStatus {
    /// Accepting members and money movements.
    #[sea_orm(string_value = "active")]
    Active,
    /// Temporarily frozen.
    #[sea_orm(string_value = "suspended")]
    Suspended,
    /// Cycle closed.
    #[sea_orm(string_value = "terminated")]
    Terminated,
}

/// Contribution frequency of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "frequency")]
#[serde(rename_all = "snake_case")]
pub enum DbFrequency {
    /// Every week.
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Twice a month.
    #[sea_orm(string_value = "biweekly")]
    Biweekly,
    /// Every month.
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "member_role")]
#[serde(rename_all = "snake_case")]
pub enum DbMemberRole {
    /// Group administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Treasurer.
    #[sea_orm(string_value = "treasurer")]
    Treasurer,
    /// Ordinary member.
    #[sea_orm(string_value = "member")]
    Member,
}

/// Status of a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "member_status")]
#[serde(rename_all = "snake_case")]
pub enum DbMemberStatus {
    /// Active member.
    #[sea_orm(string_value = "active")]
    Active,
    /// Suspended.
    #[sea_orm(string_value = "suspended")]
    Suspended,
    /// Removed from the group.
    #[sea_orm(string_value = "removed")]
    Removed,
}

/// Kind of contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contribution_type")]
#[serde(rename_all = "snake_case")]
pub enum DbContributionType {
    /// Savings deposit.
    #[sea_orm(string_value = "savings")]
    Savings,
    /// Penalty.
    #[sea_orm(string_value = "penalty")]
    Penalty,
    /// Loan repayment.
    #[sea_orm(string_value = "repayment")]
    Repayment,
    /// Interest.
    #[sea_orm(string_value = "interest")]
    Interest,
    /// Fee.
    #[sea_orm(string_value = "fee")]
    Fee,
    /// Withdrawal.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
}

/// Validation status of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contribution_status")]
#[serde(rename_all = "snake_case")]
pub enum DbContributionStatus {
    /// Awaiting validation.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Validated.
    #[sea_orm(string_value = "validated")]
    Validated,
    /// Cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Payment channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
pub enum DbPaymentMethod {
    /// Lumicash mobile money.
    #[sea_orm(string_value = "lumicash")]
    Lumicash,
    /// EcoCash mobile money.
    #[sea_orm(string_value = "ecocash")]
    Ecocash,
    /// M-Pesa mobile money.
    #[sea_orm(string_value = "mpesa")]
    Mpesa,
    /// Cash.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank transfer.
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
}

/// Lifecycle status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_status")]
#[serde(rename_all = "snake_case")]
pub enum DbLoanStatus {
    /// Awaiting decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved and disbursed.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Repayments under way.
    #[sea_orm(string_value = "active")]
    Active,
    /// Fully repaid.
    #[sea_orm(string_value = "repaid")]
    Repaid,
}

/// Kind of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
#[serde(rename_all = "snake_case")]
pub enum DbTransactionType {
    /// Savings contribution.
    #[sea_orm(string_value = "contribution_savings")]
    ContributionSavings,
    /// Penalty.
    #[sea_orm(string_value = "contribution_penalty")]
    ContributionPenalty,
    /// Interest.
    #[sea_orm(string_value = "contribution_interest")]
    ContributionInterest,
    /// Fee.
    #[sea_orm(string_value = "contribution_fee")]
    ContributionFee,
    /// Withdrawal.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Loan disbursement.
    #[sea_orm(string_value = "loan_disbursement")]
    LoanDisbursement,
    /// Loan repayment.
    #[sea_orm(string_value = "loan_repayment")]
    LoanRepayment,
}

/// Where the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_source")]
#[serde(rename_all = "snake_case")]
pub enum DbTransactionSource {
    /// Lumicash mobile money.
    #[sea_orm(string_value = "lumicash")]
    Lumicash,
    /// EcoCash mobile money.
    #[sea_orm(string_value = "ecocash")]
    Ecocash,
    /// M-Pesa mobile money.
    #[sea_orm(string_value = "mpesa")]
    Mpesa,
    /// Cash.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank transfer.
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// Internal bookkeeping.
    #[sea_orm(string_value = "internal")]
    Internal,
}

/// Settlement status of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "snake_case")]
pub enum DbTransactionStatus {
    /// Settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Awaiting payment-channel confirmation.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payment channel reported failure.
    #[sea_orm(string_value = "failed")]
    Failed,
}

macro_rules! mirror_enum {
    ($db:ident, $core:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(DbGroupType, GroupType, [Vsla, Tontine, Solidarity]);
mirror_enum!(DbGroupStatus, GroupStatus, [Active, Suspended, Terminated]);
mirror_enum!(DbFrequency, Frequency, [Weekly, Biweekly, Monthly]);
mirror_enum!(DbMemberRole, MemberRole, [Admin, Treasurer, Member]);
mirror_enum!(DbMemberStatus, MemberStatus, [Active, Suspended, Removed]);
mirror_enum!(
    DbContributionType,
    ContributionType,
    [Savings, Penalty, Repayment, Interest, Fee, Withdrawal]
);
mirror_enum!(
    DbContributionStatus,
    ContributionStatus,
    [Pending, Validated, Cancelled]
);
mirror_enum!(
    DbPaymentMethod,
    PaymentMethod,
    [Lumicash, Ecocash, Mpesa, Cash, BankTransfer]
);
mirror_enum!(
    DbLoanStatus,
    LoanStatus,
    [Pending, Approved, Rejected, Active, Repaid]
);
mirror_enum!(
    DbTransactionType,
    TransactionKind,
    [
        ContributionSavings,
        ContributionPenalty,
        ContributionInterest,
        ContributionFee,
        Withdrawal,
        LoanDisbursement,
        LoanRepayment,
    ]
);
mirror_enum!(
    DbTransactionSource,
    TransactionSource,
    [Lumicash, Ecocash, Mpesa, Cash, BankTransfer, Internal]
);
mirror_enum!(
    DbTransactionStatus,
    TransactionStatus,
    [Completed, Pending, Failed]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_status_round_trip() {
        for status in [
            LoanStatus::Pending,
            LoanStatus::Approved,
            LoanStatus::Rejected,
            LoanStatus::Active,
            LoanStatus::Repaid,
        ] {
            assert_eq!(LoanStatus::from(DbLoanStatus::from(status)), status);
        }
    }

    #[test]
    fn test_transaction_kind_round_trip() {
        for kind in [
            TransactionKind::ContributionSavings,
            TransactionKind::ContributionPenalty,
            TransactionKind::ContributionInterest,
            TransactionKind::ContributionFee,
            TransactionKind::Withdrawal,
            TransactionKind::LoanDisbursement,
            TransactionKind::LoanRepayment,
        ] {
            assert_eq!(
                TransactionKind::from(DbTransactionType::from(kind)),
                kind
            );
        }
    }
}
