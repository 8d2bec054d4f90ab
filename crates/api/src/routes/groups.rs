//! Savings-group management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_core::group::{Frequency, GroupStatus, GroupType};
use twungurane_db::repositories::contribution::ContributionRepository;
use twungurane_db::repositories::group::{
    CreateGroupInput, GroupError, GroupFilter, GroupRepository, UpdateGroupInput,
};
use twungurane_shared::types::{PageRequest, PageResponse, is_valid_amount, round_amount};

/// Creates the group routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create_group))
        .route("/groups", get(list_groups))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}", put(update_group))
        .route("/groups/{group_id}", delete(delete_group))
        .route("/groups/{group_id}/balance", get(get_group_balance))
}

/// Request body for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    /// Group name (unique among live groups).
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Kind of group: `vsla`, `tontine` or `solidarity`.
    pub group_type: GroupType,
    /// Expected contribution per period, in FBU.
    pub contribution_amount: Decimal,
    /// Contribution frequency: `weekly`, `biweekly` or `monthly`.
    pub frequency: Frequency,
    /// Annual loan interest rate in percent. Defaults from config.
    pub interest_rate: Option<Decimal>,
    /// Late-penalty rate in percent. Defaults from config.
    pub penalty_rate: Option<Decimal>,
    /// Cycle duration in months.
    #[validate(range(min = 1, max = 24))]
    pub duration_months: i32,
    /// Maximum number of members (default 20).
    #[validate(range(min = 2, max = 50))]
    pub max_members: Option<i32>,
}

/// Request body for updating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGroupRequest {
    /// Group name.
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,
    /// Description; explicit `null` clears it, absence leaves it alone.
    #[serde(default, deserialize_with = "present_field")]
    pub description: Option<Option<String>>,
    /// Lifecycle status: `active`, `suspended` or `terminated`.
    pub status: Option<GroupStatus>,
    /// Expected contribution per period.
    pub contribution_amount: Option<Decimal>,
    /// Annual loan interest rate; only affects future loans.
    pub interest_rate: Option<Decimal>,
    /// Penalty rate.
    pub penalty_rate: Option<Decimal>,
    /// Maximum number of members.
    #[validate(range(min = 2, max = 50))]
    pub max_members: Option<i32>,
}

/// Marks a field as present even when its value is `null`.
fn present_field<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Query parameters for listing groups.
#[derive(Debug, Deserialize)]
pub struct ListGroupsQuery {
    /// Filter by status.
    pub status: Option<GroupStatus>,
    /// Filter by kind.
    #[serde(rename = "type")]
    pub group_type: Option<GroupType>,
}

/// POST `/groups` - Create a group; the creator becomes its admin.
async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    if let Err(e) = payload.validate() {
        return access::validation_failed(&e);
    }
    if !is_valid_amount(payload.contribution_amount) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Contribution amount must be a positive money amount"
            })),
        )
            .into_response();
    }

    let repo = GroupRepository::new((*state.db).clone());
    let input = CreateGroupInput {
        name: payload.name,
        description: payload.description,
        group_type: payload.group_type,
        contribution_amount: round_amount(payload.contribution_amount),
        frequency: payload.frequency,
        interest_rate: payload
            .interest_rate
            .unwrap_or(state.rules.default_interest_rate),
        penalty_rate: payload
            .penalty_rate
            .unwrap_or(state.rules.default_penalty_rate),
        duration_months: payload.duration_months,
        max_members: payload.max_members.unwrap_or(20),
        created_by: auth.user_id(),
    };

    match repo.create_group(input).await {
        Ok(group) => {
            info!(group_id = %group.id, name = %group.name, "Group created");
            (StatusCode::CREATED, Json(json!({ "group": group }))).into_response()
        }
        Err(e) => map_group_error(&e),
    }
}

/// GET `/groups` - List the caller's groups (all groups for platform admins).
async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListGroupsQuery>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let repo = GroupRepository::new((*state.db).clone());
    let filter = GroupFilter {
        status: query.status,
        group_type: query.group_type,
        member_user_id: (!auth.is_platform_admin()).then(|| auth.user_id()),
    };

    match repo.list_groups(filter, page.offset(), page.limit()).await {
        Ok((groups, total)) => {
            Json(PageResponse::new(groups, page.page, page.per_page, total)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list groups");
            access::internal_error()
        }
    }
}

/// GET `/groups/{group_id}` - Show a group with its financial summary.
async fn get_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = GroupRepository::new((*state.db).clone());
    let group = match repo.find_by_id(group_id).await {
        Ok(Some(group)) => group,
        Ok(None) => return group_not_found(group_id),
        Err(e) => {
            error!(error = %e, "Failed to fetch group");
            return access::internal_error();
        }
    };

    match repo.balance_summary(group_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "group": group,
                "summary": {
                    "balance": summary.balance,
                    "total_savings": summary.total_savings,
                    "outstanding_loan_principal": summary.outstanding_loan_principal,
                    "reserved_for_requests": summary.reserved_for_requests,
                    "available_loan_funds": summary.available_loan_funds,
                    "member_count": summary.member_count,
                }
            })),
        )
            .into_response(),
        Err(e) => map_group_error(&e),
    }
}

/// PUT `/groups/{group_id}` - Update group settings.
async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }
    if let Err(e) = payload.validate() {
        return access::validation_failed(&e);
    }

    let repo = GroupRepository::new((*state.db).clone());
    let input = UpdateGroupInput {
        name: payload.name,
        description: payload.description,
        status: payload.status,
        contribution_amount: payload.contribution_amount,
        interest_rate: payload.interest_rate,
        penalty_rate: payload.penalty_rate,
        max_members: payload.max_members,
    };

    match repo.update_group(group_id, input).await {
        Ok(group) => {
            info!(group_id = %group.id, "Group updated");
            (StatusCode::OK, Json(json!({ "group": group }))).into_response()
        }
        Err(e) => map_group_error(&e),
    }
}

/// DELETE `/groups/{group_id}` - Soft-delete a group.
async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = GroupRepository::new((*state.db).clone());
    match repo.soft_delete(group_id).await {
        Ok(()) => {
            info!(group_id = %group_id, "Group deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => map_group_error(&e),
    }
}

/// GET `/groups/{group_id}/balance` - Balance and collected totals.
async fn get_group_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let group_repo = GroupRepository::new((*state.db).clone());
    let summary = match group_repo.balance_summary(group_id).await {
        Ok(summary) => summary,
        Err(e) => return map_group_error(&e),
    };

    let contribution_repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    match contribution_repo.group_stats(group_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "balance": summary.balance,
                "total_savings": summary.total_savings,
                "outstanding_loan_principal": summary.outstanding_loan_principal,
                "reserved_for_requests": summary.reserved_for_requests,
                "available_loan_funds": summary.available_loan_funds,
                "member_count": summary.member_count,
                "penalties_collected": stats.total_penalties,
                "interest_collected": stats.total_interest,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to compute contribution stats");
            access::internal_error()
        }
    }
}

fn map_group_error(e: &GroupError) -> axum::response::Response {
    match e {
        GroupError::NotFound(id) => group_not_found(*id),
        GroupError::DuplicateName(name) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "duplicate_name",
                "message": format!("Group name '{name}' is already in use")
            })),
        )
            .into_response(),
        GroupError::HasOutstandingLoans(count) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "outstanding_loans",
                "message": format!("Group has {count} outstanding loans and cannot be deleted")
            })),
        )
            .into_response(),
        GroupError::Database(e) => {
            error!(error = %e, "Group operation failed");
            access::internal_error()
        }
    }
}

fn group_not_found(id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "group_not_found",
            "message": format!("Group not found: {id}")
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_description_left_alone() {
        let payload: UpdateGroupRequest = serde_json::from_str(r#"{"name": "Abc"}"#).unwrap();
        assert_eq!(payload.description, None);
    }

    #[test]
    fn test_null_description_clears() {
        let payload: UpdateGroupRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(payload.description, Some(None));
    }

    #[test]
    fn test_given_description_replaces() {
        let payload: UpdateGroupRequest =
            serde_json::from_str(r#"{"description": "Weekly pot"}"#).unwrap();
        assert_eq!(payload.description, Some(Some("Weekly pot".to_string())));
    }
}
