//! Contribution recording rules.

pub mod error;
pub mod service;
pub mod types;

pub use error::ContributionError;
pub use service::{ContributionService, NewContribution, RepaymentTarget};
pub use types::{BalanceEffect, ContributionStatus, ContributionType, PaymentMethod};
