//! Group membership routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_core::group::{MemberRole, MemberStatus};
use twungurane_db::MemberRepository;
use twungurane_db::repositories::member::MemberError;

/// Creates the membership routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/members", post(add_member))
        .route("/groups/{group_id}/members", get(list_members))
        .route(
            "/groups/{group_id}/members/{membership_id}",
            put(update_member),
        )
        .route(
            "/groups/{group_id}/members/{membership_id}",
            delete(remove_member),
        )
}

/// Request body for adding a member.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to enroll.
    pub user_id: Uuid,
    /// Role in the group: `admin`, `treasurer` or `member` (default).
    pub role: Option<MemberRole>,
}

/// Request body for updating a member.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role.
    pub role: Option<MemberRole>,
    /// New status: `active`, `suspended` or `removed`.
    pub status: Option<MemberStatus>,
}

/// POST `/groups/{group_id}/members` - Enroll a user into a group.
async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = MemberRepository::new((*state.db).clone());
    let role = payload.role.unwrap_or(MemberRole::Member);

    match repo.add_member(group_id, payload.user_id, role).await {
        Ok(membership) => {
            info!(
                group_id = %group_id,
                user_id = %payload.user_id,
                "Member added"
            );
            (
                StatusCode::CREATED,
                Json(json!({ "membership": membership })),
            )
                .into_response()
        }
        Err(e) => map_member_error(&e),
    }
}

/// GET `/groups/{group_id}/members` - List a group's members.
async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = MemberRepository::new((*state.db).clone());
    match repo.list_members(group_id).await {
        Ok(members) => {
            let members: Vec<serde_json::Value> = members
                .into_iter()
                .map(|m| {
                    json!({
                        "membership": m.membership,
                        "user": {
                            "id": m.user.id,
                            "full_name": m.user.full_name,
                            "phone": m.user.phone,
                        },
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "members": members }))).into_response()
        }
        Err(e) => map_member_error(&e),
    }
}

/// PUT `/groups/{group_id}/members/{membership_id}` - Change role or status.
async fn update_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = MemberRepository::new((*state.db).clone());
    match repo
        .update_member(membership_id, payload.role, payload.status)
        .await
    {
        Ok(membership) => {
            info!(membership_id = %membership_id, "Member updated");
            (StatusCode::OK, Json(json!({ "membership": membership }))).into_response()
        }
        Err(e) => map_member_error(&e),
    }
}

/// DELETE `/groups/{group_id}/members/{membership_id}` - Remove a member.
async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, membership_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = MemberRepository::new((*state.db).clone());
    match repo.remove_member(membership_id).await {
        Ok(()) => {
            info!(membership_id = %membership_id, "Member removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => map_member_error(&e),
    }
}

fn map_member_error(e: &MemberError) -> axum::response::Response {
    match e {
        MemberError::GroupNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "group_not_found",
                "message": format!("Group not found: {id}")
            })),
        )
            .into_response(),
        MemberError::GroupNotActive => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "group_not_active",
                "message": "Group is not active"
            })),
        )
            .into_response(),
        MemberError::GroupFull(max) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "group_full",
                "message": format!("Group is already at its capacity of {max} members")
            })),
        )
            .into_response(),
        MemberError::UserNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "user_not_found",
                "message": format!("User not found: {id}")
            })),
        )
            .into_response(),
        MemberError::AlreadyMember => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "already_member",
                "message": "User is already a member of this group"
            })),
        )
            .into_response(),
        MemberError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "membership_not_found",
                "message": format!("Membership not found: {id}")
            })),
        )
            .into_response(),
        MemberError::HasOutstandingLoan => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "member_has_loan",
                "message": "Member has an outstanding loan and cannot be removed"
            })),
        )
            .into_response(),
        MemberError::Database(e) => {
            error!(error = %e, "Membership operation failed");
            access::internal_error()
        }
    }
}
