//! Client for the analytics microservice.
//!
//! The service accepts group/member snapshots and returns computed risk
//! scores, projections and rankings. This client only serializes our
//! entities into the expected shape and forwards them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Analytics client errors.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The collaborator is not configured.
    #[error("analytics service is not configured")]
    NotConfigured,
    /// Transport-level failure.
    #[error("analytics request failed: {0}")]
    Request(String),
    /// The service answered with a non-success status.
    #[error("analytics service returned status {0}")]
    Status(u16),
}

/// Snapshot of a group sent for risk scoring.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    /// Group ID.
    pub group_id: Uuid,
    /// Group name.
    pub name: String,
    /// Current group balance.
    pub balance: Decimal,
    /// Active member count.
    pub member_count: u64,
    /// Contribution history entries.
    pub contributions: Vec<SnapshotContribution>,
    /// Loan history entries.
    pub loans: Vec<SnapshotLoan>,
}

/// A contribution row inside a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotContribution {
    /// Contributing member's user ID.
    pub user_id: Uuid,
    /// Amount.
    pub amount: Decimal,
    /// Contribution type as its wire string.
    pub contribution_type: String,
    /// Date of the contribution.
    pub date: NaiveDate,
}

/// A loan row inside a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotLoan {
    /// Borrower's user ID.
    pub user_id: Uuid,
    /// Principal.
    pub principal: Decimal,
    /// Total payable.
    pub total_payable: Decimal,
    /// Amount repaid so far.
    pub amount_repaid: Decimal,
    /// Loan status as its wire string.
    pub status: String,
}

/// Risk assessment returned by the analytics service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Group-level risk score (0-100, higher is riskier).
    pub risk_score: Decimal,
    /// Projected balance at end of cycle.
    pub projected_balance: Option<Decimal>,
    /// Member user IDs ranked from most to least reliable.
    #[serde(default)]
    pub member_ranking: Vec<Uuid>,
}

/// Client for the analytics microservice.
#[derive(Clone)]
pub struct AnalyticsClient {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl AnalyticsClient {
    /// Creates a new analytics client. `base_url` of `None` disables it.
    #[must_use]
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Returns true if the collaborator is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Submits a group snapshot for risk scoring.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is not configured, unreachable,
    /// or answers with a non-success status.
    pub async fn score_group(
        &self,
        snapshot: &GroupSnapshot,
    ) -> Result<RiskAssessment, AnalyticsError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(AnalyticsError::NotConfigured)?;
        let url = format!("{}/api/v1/groups/score", base.trim_end_matches('/'));

        let response = self
            .http
            .post(url)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| AnalyticsError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalyticsError::Status(response.status().as_u16()));
        }

        response
            .json::<RiskAssessment>()
            .await
            .map_err(|e| AnalyticsError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_client() {
        let client = AnalyticsClient::new(None);
        assert!(!client.is_configured());
    }

    #[test]
    fn test_configured_client() {
        let client = AnalyticsClient::new(Some("http://analytics:8000".to_string()));
        assert!(client.is_configured());
    }
}
