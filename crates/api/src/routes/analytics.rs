//! Analytics proxy: snapshots a group and forwards it for risk scoring.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_db::MemberRepository;
use twungurane_db::repositories::contribution::{ContributionFilter, ContributionRepository};
use twungurane_db::repositories::group::GroupRepository;
use twungurane_db::repositories::loan::{LoanFilter, LoanRepository};
use twungurane_shared::clients::analytics::{
    AnalyticsError, GroupSnapshot, SnapshotContribution, SnapshotLoan,
};

/// Rows included in a snapshot; enough history for scoring without
/// shipping the whole ledger.
const SNAPSHOT_LIMIT: u64 = 500;

/// Creates the analytics routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/groups/{group_id}/analytics/risk", get(score_group))
}

/// GET `/groups/{group_id}/analytics/risk` - Risk assessment for a group.
async fn score_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let group_repo = GroupRepository::new((*state.db).clone());
    let group = match group_repo.find_by_id(group_id).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "group_not_found",
                    "message": format!("Group not found: {group_id}")
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch group");
            return access::internal_error();
        }
    };

    let member_repo = MemberRepository::new((*state.db).clone());
    let member_count = match member_repo.list_members(group_id).await {
        Ok(members) => members.len() as u64,
        Err(e) => {
            error!(error = %e, "Failed to list members");
            return access::internal_error();
        }
    };

    let contribution_repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let contributions = match contribution_repo
        .list_for_group(group_id, ContributionFilter::default(), 0, SNAPSHOT_LIMIT)
        .await
    {
        Ok((rows, _)) => rows,
        Err(e) => {
            error!(error = %e, "Failed to list contributions");
            return access::internal_error();
        }
    };

    let loan_repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let loans = match loan_repo
        .list_for_group(group_id, LoanFilter::default(), 0, SNAPSHOT_LIMIT)
        .await
    {
        Ok((rows, _)) => rows,
        Err(e) => {
            error!(error = %e, "Failed to list loans");
            return access::internal_error();
        }
    };

    let snapshot = GroupSnapshot {
        group_id,
        name: group.name,
        balance: group.balance,
        member_count,
        contributions: contributions
            .iter()
            .map(|c| SnapshotContribution {
                user_id: c.user_id,
                amount: c.amount,
                contribution_type: json_wire_string(&c.contribution_type),
                date: c.contribution_date,
            })
            .collect(),
        loans: loans
            .iter()
            .map(|l| SnapshotLoan {
                user_id: l.user_id,
                principal: l.principal,
                total_payable: l.total_payable,
                amount_repaid: l.amount_repaid,
                status: json_wire_string(&l.status),
            })
            .collect(),
    };

    match state.analytics.score_group(&snapshot).await {
        Ok(assessment) => (StatusCode::OK, Json(json!({ "assessment": assessment })))
            .into_response(),
        Err(AnalyticsError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "analytics_unavailable",
                "message": "Analytics service is not configured"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Analytics request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "analytics_failed",
                    "message": "Analytics service did not answer"
                })),
            )
                .into_response()
        }
    }
}

/// Serializes an enum to its wire string (e.g. `savings`).
fn json_wire_string<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use twungurane_db::entities::sea_orm_active_enums::{DbContributionType, DbLoanStatus};

    #[test]
    fn test_wire_strings() {
        assert_eq!(json_wire_string(&DbContributionType::Savings), "savings");
        assert_eq!(json_wire_string(&DbLoanStatus::Repaid), "repaid");
    }
}
