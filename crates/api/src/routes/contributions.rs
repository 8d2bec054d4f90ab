//! Contribution routes: recording, validation, correction and listing.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_core::contribution::{
    ContributionError, ContributionStatus, ContributionType, PaymentMethod,
};
use twungurane_db::UserRepository;
use twungurane_db::entities::contributions;
use twungurane_db::repositories::contribution::{
    ContributionFilter, ContributionRepoError, ContributionRepository, RecordContributionInput,
    UpdateContributionInput,
};
use twungurane_shared::clients::payments::{PaymentDirection, PaymentRequest};
use twungurane_shared::types::{PageRequest, PageResponse, is_valid_amount, round_amount};

/// Creates the contribution routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/contributions", post(record_contribution))
        .route("/groups/{group_id}/contributions", get(list_contributions))
        .route(
            "/groups/{group_id}/contributions/stats",
            get(contribution_stats),
        )
        .route("/contributions/{contribution_id}", get(get_contribution))
        .route("/contributions/{contribution_id}", put(update_contribution))
        .route(
            "/contributions/{contribution_id}",
            delete(delete_contribution),
        )
        .route(
            "/contributions/{contribution_id}/validate",
            post(validate_contribution),
        )
}

/// Request body for recording a contribution.
#[derive(Debug, Deserialize)]
pub struct RecordContributionRequest {
    /// Paying member; defaults to the caller.
    pub user_id: Option<Uuid>,
    /// Loan being repaid; required for `repayment` contributions.
    pub loan_id: Option<Uuid>,
    /// Amount in FBU.
    pub amount: Decimal,
    /// Kind: `savings`, `penalty`, `repayment`, `interest`, `fee` or
    /// `withdrawal`.
    pub contribution_type: ContributionType,
    /// Channel: `lumicash`, `ecocash`, `mpesa`, `cash` or `bank_transfer`.
    pub payment_method: PaymentMethod,
    /// Date the money changed hands; defaults to today.
    pub contribution_date: Option<NaiveDate>,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Request body for updating a pending contribution.
#[derive(Debug, Deserialize)]
pub struct UpdateContributionRequest {
    /// Amount.
    pub amount: Option<Decimal>,
    /// Payment channel.
    pub payment_method: Option<PaymentMethod>,
    /// Date the money changed hands.
    pub contribution_date: Option<NaiveDate>,
    /// Notes.
    pub notes: Option<String>,
}

/// Query parameters for listing contributions.
#[derive(Debug, Deserialize)]
pub struct ListContributionsQuery {
    /// Filter by member.
    pub user_id: Option<Uuid>,
    /// Filter by kind.
    #[serde(rename = "type")]
    pub contribution_type: Option<ContributionType>,
    /// Filter by status.
    pub status: Option<ContributionStatus>,
    /// Filter by payment channel.
    pub payment_method: Option<PaymentMethod>,
    /// Start of the date range (inclusive).
    pub from: Option<NaiveDate>,
    /// End of the date range (inclusive).
    pub to: Option<NaiveDate>,
}

/// POST `/groups/{group_id}/contributions` - Record a contribution.
///
/// Cash and bank contributions settle immediately. Mobile-money ones
/// are stored pending and a collection (or disbursement, for
/// withdrawals) is initiated at the gateway; the callback settles them.
async fn record_contribution(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<RecordContributionRequest>,
) -> impl IntoResponse {
    let user_id = payload.user_id.unwrap_or_else(|| auth.user_id());

    // Recording on someone else's behalf needs a privileged role.
    if user_id == auth.user_id() {
        if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
            return response;
        }
    } else if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }

    if !is_valid_amount(payload.amount) {
        return invalid_amount(payload.amount);
    }

    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let input = RecordContributionInput {
        group_id,
        user_id,
        loan_id: payload.loan_id,
        amount: round_amount(payload.amount),
        contribution_type: payload.contribution_type,
        payment_method: payload.payment_method,
        contribution_date: payload
            .contribution_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        notes: payload.notes,
        recorded_by: auth.user_id(),
    };

    let recorded = match repo.record(input).await {
        Ok(recorded) => recorded,
        Err(e) => return map_contribution_error(&e),
    };

    info!(
        group_id = %group_id,
        contribution_id = %recorded.contribution.id,
        amount = %recorded.contribution.amount,
        "Contribution recorded"
    );

    // The gateway call happens strictly after the commit; a failure
    // here leaves the contribution pending for manual resolution.
    let payment = match &recorded.pending_reference {
        Some(reference) => {
            let initiated =
                initiate_payment(&state, &recorded.contribution, reference).await;
            json!({ "reference": reference, "initiated": initiated })
        }
        None => serde_json::Value::Null,
    };

    (
        StatusCode::CREATED,
        Json(json!({
            "contribution": recorded.contribution,
            "payment": payment,
        })),
    )
        .into_response()
}

/// GET `/groups/{group_id}/contributions` - List contributions.
async fn list_contributions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListContributionsQuery>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let filter = ContributionFilter {
        user_id: query.user_id,
        contribution_type: query.contribution_type,
        status: query.status,
        payment_method: query.payment_method,
        date_from: query.from,
        date_to: query.to,
    };

    match repo
        .list_for_group(group_id, filter, page.offset(), page.limit())
        .await
    {
        Ok((rows, total)) => {
            Json(PageResponse::new(rows, page.page, page.per_page, total)).into_response()
        }
        Err(e) => map_contribution_error(&e),
    }
}

/// GET `/groups/{group_id}/contributions/stats` - Aggregate figures.
async fn contribution_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    match repo.group_stats(group_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "total_savings": stats.total_savings,
                "total_penalties": stats.total_penalties,
                "total_interest": stats.total_interest,
                "total_repayments": stats.total_repayments,
                "savings_this_month": stats.savings_this_month,
            })),
        )
            .into_response(),
        Err(e) => map_contribution_error(&e),
    }
}

/// GET `/contributions/{contribution_id}` - Fetch one contribution.
async fn get_contribution(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contribution_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let contribution = match repo.find_by_id(contribution_id).await {
        Ok(Some(contribution)) => contribution,
        Ok(None) => return contribution_not_found(contribution_id),
        Err(e) => return map_contribution_error(&e),
    };

    if let Err(response) =
        access::require_member(&state.db, contribution.group_id, &auth).await
    {
        return response;
    }

    (
        StatusCode::OK,
        Json(json!({ "contribution": contribution })),
    )
        .into_response()
}

/// PUT `/contributions/{contribution_id}` - Edit a pending contribution.
async fn update_contribution(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contribution_id): Path<Uuid>,
    Json(payload): Json<UpdateContributionRequest>,
) -> impl IntoResponse {
    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let contribution = match repo.find_by_id(contribution_id).await {
        Ok(Some(contribution)) => contribution,
        Ok(None) => return contribution_not_found(contribution_id),
        Err(e) => return map_contribution_error(&e),
    };

    // Owners edit their own pending contributions; treasurers any.
    if contribution.user_id != auth.user_id()
        && let Err(response) =
            access::require_fund_manager(&state.db, contribution.group_id, &auth).await
    {
        return response;
    }

    if let Some(amount) = payload.amount
        && !is_valid_amount(amount)
    {
        return invalid_amount(amount);
    }

    let input = UpdateContributionInput {
        amount: payload.amount.map(round_amount),
        payment_method: payload.payment_method,
        contribution_date: payload.contribution_date,
        notes: payload.notes.map(Some),
    };

    match repo.update(contribution_id, input).await {
        Ok(contribution) => (
            StatusCode::OK,
            Json(json!({ "contribution": contribution })),
        )
            .into_response(),
        Err(e) => map_contribution_error(&e),
    }
}

/// DELETE `/contributions/{contribution_id}` - Delete or reverse.
///
/// Pending contributions are deleted outright. Validated repayments can
/// be reversed by a group admin/treasurer or platform admin.
async fn delete_contribution(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contribution_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let contribution = match repo.find_by_id(contribution_id).await {
        Ok(Some(contribution)) => contribution,
        Ok(None) => return contribution_not_found(contribution_id),
        Err(e) => return map_contribution_error(&e),
    };

    let privileged = access::require_fund_manager(&state.db, contribution.group_id, &auth)
        .await
        .is_ok();
    if !privileged && contribution.user_id != auth.user_id() {
        if let Err(response) =
            access::require_member(&state.db, contribution.group_id, &auth).await
        {
            return response;
        }
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Only the contributor or a treasurer may delete this"
            })),
        )
            .into_response();
    }

    match repo.delete(contribution_id, privileged).await {
        Ok(()) => {
            info!(contribution_id = %contribution_id, "Contribution deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => map_contribution_error(&e),
    }
}

/// POST `/contributions/{contribution_id}/validate` - Settle a pending
/// contribution manually.
async fn validate_contribution(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contribution_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ContributionRepository::new(
        (*state.db).clone(),
        state.contribution_rules,
        state.loan_rules,
    );
    let contribution = match repo.find_by_id(contribution_id).await {
        Ok(Some(contribution)) => contribution,
        Ok(None) => return contribution_not_found(contribution_id),
        Err(e) => return map_contribution_error(&e),
    };

    if let Err(response) =
        access::require_fund_manager(&state.db, contribution.group_id, &auth).await
    {
        return response;
    }

    match repo.validate(contribution_id, auth.user_id(), None).await {
        Ok(contribution) => {
            info!(contribution_id = %contribution_id, "Contribution validated");
            (
                StatusCode::OK,
                Json(json!({ "contribution": contribution })),
            )
                .into_response()
        }
        Err(e) => map_contribution_error(&e),
    }
}

/// Initiates the mobile-money operation for a freshly recorded pending
/// contribution. Returns whether the gateway accepted it.
async fn initiate_payment(
    state: &AppState,
    contribution: &contributions::Model,
    reference: &str,
) -> bool {
    if !state.payments.is_configured() {
        warn!(reference, "Payments gateway not configured; left pending");
        return false;
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let phone = match user_repo.find_by_id(contribution.user_id).await {
        Ok(Some(user)) => user.phone,
        Ok(None) | Err(_) => {
            error!(reference, "Could not resolve payer phone number");
            return false;
        }
    };

    let direction = match ContributionType::from(contribution.contribution_type) {
        ContributionType::Withdrawal => PaymentDirection::Disbursement,
        _ => PaymentDirection::Collection,
    };
    let channel = match PaymentMethod::from(contribution.payment_method) {
        PaymentMethod::Lumicash => "lumicash",
        PaymentMethod::Ecocash => "ecocash",
        PaymentMethod::Mpesa => "mpesa",
        PaymentMethod::Cash | PaymentMethod::BankTransfer => return false,
    };

    let request = PaymentRequest {
        reference: reference.to_string(),
        direction,
        channel: channel.to_string(),
        phone,
        amount: contribution.amount,
    };

    match state.payments.initiate(&request).await {
        Ok(ack) => {
            info!(
                reference,
                channel_reference = %ack.channel_reference,
                "Payment initiated"
            );
            true
        }
        Err(e) => {
            error!(reference, error = %e, "Payment initiation failed");
            false
        }
    }
}

fn map_contribution_error(e: &ContributionRepoError) -> axum::response::Response {
    let (status, code, message) = match e {
        ContributionRepoError::GroupNotFound(id) => (
            StatusCode::NOT_FOUND,
            "group_not_found",
            format!("Group not found: {id}"),
        ),
        ContributionRepoError::GroupNotActive => (
            StatusCode::CONFLICT,
            "group_not_active",
            "Group is not active".to_string(),
        ),
        ContributionRepoError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            "contribution_not_found",
            format!("Contribution not found: {id}"),
        ),
        ContributionRepoError::LoanNotFound(id) => (
            StatusCode::NOT_FOUND,
            "loan_not_found",
            format!("Loan not found: {id}"),
        ),
        ContributionRepoError::Rule(rule) => {
            let code = match rule {
                ContributionError::InvalidAmount(_) | ContributionError::BelowMinimum { .. } => {
                    "invalid_amount"
                }
                ContributionError::FutureDate(_) => "future_date",
                ContributionError::MemberNotActive => "member_not_active",
                ContributionError::MissingLoanReference
                | ContributionError::LoanMismatch
                | ContributionError::LoanNotRepayable => "invalid_loan_reference",
                ContributionError::NotPending => "not_pending",
            };
            (StatusCode::UNPROCESSABLE_ENTITY, code, rule.to_string())
        }
        ContributionRepoError::Loan(rule) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "loan_rule_violation",
            rule.to_string(),
        ),
        ContributionRepoError::Balance(rule) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_balance",
            rule.to_string(),
        ),
        ContributionRepoError::ReversalNotAllowed => (
            StatusCode::FORBIDDEN,
            "reversal_not_allowed",
            "Only privileged callers may reverse a validated repayment".to_string(),
        ),
        ContributionRepoError::Database(e) => {
            error!(error = %e, "Contribution operation failed");
            return access::internal_error();
        }
    };

    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

fn invalid_amount(amount: Decimal) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_amount",
            "message": format!("'{amount}' is not a valid money amount")
        })),
    )
        .into_response()
}

fn contribution_not_found(id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "contribution_not_found",
            "message": format!("Contribution not found: {id}")
        })),
    )
        .into_response()
}
