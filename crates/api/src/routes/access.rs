//! Group-level access checks shared by the protected routes.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use twungurane_core::group::MemberRole;
use twungurane_db::MemberRepository;
use twungurane_db::entities::group_members;
use twungurane_db::entities::sea_orm_active_enums::DbMemberStatus;
use twungurane_shared::AppError;

use crate::middleware::AuthUser;

/// Requires the caller to be an active member of the group.
///
/// Platform administrators pass without a membership row; `Ok(None)`
/// marks that case.
pub(crate) async fn require_member(
    db: &DatabaseConnection,
    group_id: Uuid,
    auth: &AuthUser,
) -> Result<Option<group_members::Model>, Response> {
    if auth.is_platform_admin() {
        return Ok(None);
    }

    let repo = MemberRepository::new(db.clone());
    match repo.find_membership(group_id, auth.user_id()).await {
        Ok(Some(membership)) if membership.status == DbMemberStatus::Active => {
            Ok(Some(membership))
        }
        Ok(_) => Err(app_error(&AppError::Forbidden(
            "You are not an active member of this group".to_string(),
        ))),
        Err(e) => {
            error!(error = %e, "Failed to resolve membership");
            Err(internal_error())
        }
    }
}

/// Requires the caller to be a group admin/treasurer or a platform
/// administrator.
pub(crate) async fn require_fund_manager(
    db: &DatabaseConnection,
    group_id: Uuid,
    auth: &AuthUser,
) -> Result<(), Response> {
    match require_member(db, group_id, auth).await? {
        // Platform admin.
        None => Ok(()),
        Some(membership) => {
            if MemberRole::from(membership.role).can_manage_funds() {
                Ok(())
            } else {
                Err(app_error(&AppError::Forbidden(
                    "Only group admins and treasurers may do this".to_string(),
                )))
            }
        }
    }
}

/// Builds a JSON response from an [`AppError`].
pub(crate) fn app_error(e: &AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

/// Standard 400 response for failed payload validation.
pub(crate) fn validation_failed(e: &validator::ValidationErrors) -> Response {
    app_error(&AppError::Validation(e.to_string()))
}

/// Standard 500 response.
pub(crate) fn internal_error() -> Response {
    app_error(&AppError::Internal("An error occurred".to_string()))
}
