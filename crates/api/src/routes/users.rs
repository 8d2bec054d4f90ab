//! User management routes (platform-level).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_db::entities::sea_orm_active_enums::UserRole;
use twungurane_db::repositories::user::{CreateUserInput, UserError, UserRepository};
use twungurane_shared::types::{PageRequest, PageResponse};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user))
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Full name.
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,
    /// Burundian mobile number.
    pub phone: String,
    /// Optional email.
    #[validate(email)]
    pub email: Option<String>,
    /// Platform role: `admin` or `member` (default).
    pub role: Option<String>,
}

/// POST `/users` - Create a user (platform admin only).
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if !auth.is_platform_admin() {
        return forbidden();
    }
    if let Err(e) = payload.validate() {
        return access::validation_failed(&e);
    }

    let role = match payload.role.as_deref() {
        Some("admin") => UserRole::Admin,
        Some("member") | None => UserRole::Member,
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_role",
                    "message": format!("Unknown role '{other}'. Must be admin or member")
                })),
            )
                .into_response();
        }
    };

    let repo = UserRepository::new((*state.db).clone());
    match repo
        .create_user(CreateUserInput {
            full_name: payload.full_name,
            phone: payload.phone,
            email: payload.email,
            role,
        })
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, "User created");
            (StatusCode::CREATED, Json(json!({ "user": user }))).into_response()
        }
        Err(e) => map_user_error(&e),
    }
}

/// GET `/users` - List users, paginated (platform admin only).
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    if !auth.is_platform_admin() {
        return forbidden();
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.list_users(page.offset(), page.limit()).await {
        Ok((users, total)) => Json(PageResponse::new(users, page.page, page.per_page, total))
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list users");
            access::internal_error()
        }
    }
}

/// GET `/users/{user_id}` - Get a user (self or platform admin).
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    if !auth.is_platform_admin() && auth.user_id() != user_id {
        return forbidden();
    }

    let repo = UserRepository::new((*state.db).clone());
    match repo.find_by_id(user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "user_not_found",
                "message": format!("User not found: {user_id}")
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to fetch user");
            access::internal_error()
        }
    }
}

fn map_user_error(e: &UserError) -> axum::response::Response {
    match e {
        UserError::DuplicatePhone(phone) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "duplicate_phone",
                "message": format!("Phone number '{phone}' is already registered")
            })),
        )
            .into_response(),
        UserError::InvalidPhone(phone) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_phone",
                "message": format!("'{phone}' is not a valid Burundian mobile number")
            })),
        )
            .into_response(),
        UserError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "user_not_found",
                "message": format!("User not found: {id}")
            })),
        )
            .into_response(),
        UserError::Database(e) => {
            error!(error = %e, "User operation failed");
            access::internal_error()
        }
    }
}

fn forbidden() -> axum::response::Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": "Platform administrator role required"
        })),
    )
        .into_response()
}
