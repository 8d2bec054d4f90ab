//! Loan lifecycle, amortization and repayment rules.

pub mod amortization;
pub mod error;
pub mod service;
pub mod types;

pub use amortization::{Amortization, ScheduleEntry};
pub use error::LoanError;
pub use service::{LoanRequest, LoanService, RepaymentOutcome};
pub use types::LoanStatus;
