//! HTTP clients for external collaborators.
//!
//! The accounting core never calls these inside a database transaction;
//! handlers invoke them after the core mutation commits.

pub mod analytics;
pub mod payments;

pub use analytics::{AnalyticsClient, AnalyticsError, GroupSnapshot, RiskAssessment};
pub use payments::{PaymentCallback, PaymentRequest, PaymentsClient, PaymentsError};
