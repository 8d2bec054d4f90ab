//! Closed enumerations for contributions.

use serde::{Deserialize, Serialize};

/// Kind of contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    /// Regular savings deposit.
    Savings,
    /// Late/absence penalty.
    Penalty,
    /// Loan repayment; must reference a loan.
    Repayment,
    /// Interest collected outside a loan repayment.
    Interest,
    /// Administrative fee.
    Fee,
    /// Money paid out of the pot to a member.
    Withdrawal,
}

/// Direction in which a contribution moves the group balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEffect {
    /// Increases the group balance.
    Credit,
    /// Decreases the group balance.
    Debit,
}

impl ContributionType {
    /// Returns how this contribution moves the group balance.
    #[must_use]
    pub const fn balance_effect(self) -> BalanceEffect {
        match self {
            Self::Savings | Self::Penalty | Self::Repayment | Self::Interest | Self::Fee => {
                BalanceEffect::Credit
            }
            Self::Withdrawal => BalanceEffect::Debit,
        }
    }

    /// Returns true if this kind counts toward a member's running
    /// savings total.
    #[must_use]
    pub const fn counts_toward_member_total(self) -> bool {
        matches!(self, Self::Savings)
    }

    /// Returns true if this kind must reference a loan.
    #[must_use]
    pub const fn requires_loan(self) -> bool {
        matches!(self, Self::Repayment)
    }
}

/// Validation status of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    /// Recorded but not yet validated; still mutable.
    Pending,
    /// Validated; immutable except by privileged correction.
    Validated,
    /// Cancelled before validation.
    Cancelled,
}

/// Payment channel used for a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Lumicash mobile money (Lumitel).
    Lumicash,
    /// EcoCash mobile money (Econet).
    Ecocash,
    /// M-Pesa mobile money (Vodacom).
    Mpesa,
    /// Cash handed over at a meeting.
    Cash,
    /// Bank transfer.
    BankTransfer,
}

impl PaymentMethod {
    /// Returns true if this channel goes through the mobile-money
    /// gateway (and therefore produces pending ledger rows resolved by
    /// callback).
    #[must_use]
    pub const fn is_mobile_money(self) -> bool {
        matches!(self, Self::Lumicash | Self::Ecocash | Self::Mpesa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_effects() {
        assert_eq!(
            ContributionType::Savings.balance_effect(),
            BalanceEffect::Credit
        );
        assert_eq!(
            ContributionType::Penalty.balance_effect(),
            BalanceEffect::Credit
        );
        assert_eq!(
            ContributionType::Repayment.balance_effect(),
            BalanceEffect::Credit
        );
        assert_eq!(
            ContributionType::Withdrawal.balance_effect(),
            BalanceEffect::Debit
        );
    }

    #[test]
    fn test_member_total_only_counts_savings() {
        assert!(ContributionType::Savings.counts_toward_member_total());
        assert!(!ContributionType::Penalty.counts_toward_member_total());
        assert!(!ContributionType::Repayment.counts_toward_member_total());
    }

    #[test]
    fn test_repayment_requires_loan() {
        assert!(ContributionType::Repayment.requires_loan());
        assert!(!ContributionType::Savings.requires_loan());
    }

    #[test]
    fn test_mobile_money_channels() {
        assert!(PaymentMethod::Lumicash.is_mobile_money());
        assert!(PaymentMethod::Ecocash.is_mobile_money());
        assert!(PaymentMethod::Mpesa.is_mobile_money());
        assert!(!PaymentMethod::Cash.is_mobile_money());
        assert!(!PaymentMethod::BankTransfer.is_mobile_money());
    }
}
