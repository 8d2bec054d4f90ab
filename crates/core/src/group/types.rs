//! Closed enumerations for groups and memberships.

use serde::{Deserialize, Serialize};

/// Kind of savings group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    /// Village Savings and Loan Association.
    Vsla,
    /// Rotating/communal savings circle.
    Tontine,
    /// Solidarity group.
    Solidarity,
}

/// Lifecycle status of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Accepting members and money movements.
    Active,
    /// Temporarily frozen; no new money movements.
    Suspended,
    /// Cycle closed.
    Terminated,
}

impl GroupStatus {
    /// Returns true if money movements are allowed.
    #[must_use]
    pub const fn allows_activity(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Contribution frequency of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every week.
    Weekly,
    /// Twice a month.
    Biweekly,
    /// Every month.
    Monthly,
}

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Group administrator.
    Admin,
    /// Treasurer, may record money movements.
    Treasurer,
    /// Ordinary member.
    Member,
}

impl MemberRole {
    /// Returns the privilege level of a role (higher = more privileges).
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Admin => 100,
            Self::Treasurer => 80,
            Self::Member => 20,
        }
    }

    /// Returns true if this role may approve loans and record
    /// contributions on behalf of other members.
    #[must_use]
    pub const fn can_manage_funds(self) -> bool {
        matches!(self, Self::Admin | Self::Treasurer)
    }
}

/// Status of a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Active member.
    Active,
    /// Suspended; keeps the row but blocks activity.
    Suspended,
    /// Removed from the group.
    Removed,
}

impl MemberStatus {
    /// Returns true if the membership is active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_privileges() {
        assert!(MemberRole::Admin.can_manage_funds());
        assert!(MemberRole::Treasurer.can_manage_funds());
        assert!(!MemberRole::Member.can_manage_funds());
        assert!(MemberRole::Admin.level() > MemberRole::Treasurer.level());
        assert!(MemberRole::Treasurer.level() > MemberRole::Member.level());
    }

    #[test]
    fn test_group_status_activity() {
        assert!(GroupStatus::Active.allows_activity());
        assert!(!GroupStatus::Suspended.allows_activity());
        assert!(!GroupStatus::Terminated.allows_activity());
    }
}
