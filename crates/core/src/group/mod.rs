//! Group and membership domain logic.

pub mod balance;
pub mod types;

pub use balance::{BalanceError, BalanceEvent, apply_event, available_loan_funds, recompute};
pub use types::{Frequency, GroupStatus, GroupType, MemberRole, MemberStatus};
