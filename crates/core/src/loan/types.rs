//! Loan status state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Requested, awaiting a decision.
    Pending,
    /// Approved and disbursed, no repayment received yet.
    Approved,
    /// Rejected; terminal.
    Rejected,
    /// Disbursed with repayments under way.
    Active,
    /// Fully repaid; terminal.
    Repaid,
}

impl LoanStatus {
    /// Returns true if the transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Active | Self::Repaid)
                | (Self::Active, Self::Repaid)
        )
    }

    /// Returns true if the loan still ties up or may tie up group
    /// funds. A member with an outstanding loan cannot request another.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::Active)
    }

    /// Returns true if repayments may be applied.
    #[must_use]
    pub const fn is_repayable(self) -> bool {
        matches!(self, Self::Approved | Self::Active)
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Repaid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LoanStatus::Pending, LoanStatus::Approved, true)]
    #[case(LoanStatus::Pending, LoanStatus::Rejected, true)]
    #[case(LoanStatus::Pending, LoanStatus::Repaid, false)]
    #[case(LoanStatus::Approved, LoanStatus::Active, true)]
    #[case(LoanStatus::Approved, LoanStatus::Repaid, true)]
    #[case(LoanStatus::Active, LoanStatus::Repaid, true)]
    #[case(LoanStatus::Active, LoanStatus::Approved, false)]
    #[case(LoanStatus::Rejected, LoanStatus::Pending, false)]
    #[case(LoanStatus::Repaid, LoanStatus::Active, false)]
    fn test_transitions(#[case] from: LoanStatus, #[case] to: LoanStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_outstanding_states() {
        assert!(LoanStatus::Pending.is_outstanding());
        assert!(LoanStatus::Approved.is_outstanding());
        assert!(LoanStatus::Active.is_outstanding());
        assert!(!LoanStatus::Rejected.is_outstanding());
        assert!(!LoanStatus::Repaid.is_outstanding());
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for next in [
            LoanStatus::Pending,
            LoanStatus::Approved,
            LoanStatus::Rejected,
            LoanStatus::Active,
            LoanStatus::Repaid,
        ] {
            assert!(!LoanStatus::Rejected.can_transition_to(next));
            assert!(!LoanStatus::Repaid.can_transition_to(next));
        }
    }
}
