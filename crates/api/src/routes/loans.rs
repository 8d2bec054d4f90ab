//! Loan lifecycle routes: request, decision, repayment, reporting.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_core::contribution::PaymentMethod;
use twungurane_core::loan::{LoanError, LoanStatus};
use twungurane_db::entities::loans;
use twungurane_db::repositories::group::GroupRepository;
use twungurane_db::repositories::loan::{
    LoanFilter, LoanRepoError, LoanRepository, RequestLoanInput,
};
use twungurane_shared::types::{PageRequest, PageResponse, is_valid_amount, round_amount};

/// Creates the loan routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/loans", post(request_loan))
        .route("/groups/{group_id}/loans", get(list_loans))
        .route("/groups/{group_id}/loans/stats", get(loan_stats))
        .route("/loans/{loan_id}", get(get_loan))
        .route("/loans/{loan_id}/approve", post(approve_loan))
        .route("/loans/{loan_id}/reject", post(reject_loan))
        .route("/loans/{loan_id}/repay", post(repay_loan))
}

/// Request body for requesting a loan.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestLoanRequest {
    /// Principal asked for, in FBU.
    pub principal: Decimal,
    /// Term in months (1-12).
    pub term_months: u32,
    /// What the loan is for.
    #[validate(length(min = 3, max = 500))]
    pub purpose: String,
    /// Optional guarantee text.
    pub guarantee: Option<String>,
}

/// Request body for rejecting a loan.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectLoanRequest {
    /// Why the request was turned down.
    #[validate(length(min = 3, max = 500))]
    pub reason: String,
}

/// Request body for repaying a loan.
#[derive(Debug, Deserialize)]
pub struct RepayLoanRequest {
    /// Amount to repay; clamped to what is outstanding.
    pub amount: Decimal,
    /// Payment channel (default `cash`).
    pub payment_method: Option<PaymentMethod>,
}

/// Query parameters for listing loans.
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// Filter by borrower.
    pub user_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<LoanStatus>,
}

/// POST `/groups/{group_id}/loans` - Request a loan.
async fn request_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<RequestLoanRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }
    if let Err(e) = payload.validate() {
        return access::validation_failed(&e);
    }
    if !is_valid_amount(payload.principal) {
        return invalid_amount(payload.principal);
    }

    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let input = RequestLoanInput {
        group_id,
        user_id: auth.user_id(),
        principal: round_amount(payload.principal),
        term_months: payload.term_months,
        purpose: payload.purpose,
        guarantee: payload.guarantee,
    };

    match repo.request(input).await {
        Ok(loan) => {
            info!(
                group_id = %group_id,
                loan_id = %loan.id,
                principal = %loan.principal,
                "Loan requested"
            );
            (StatusCode::CREATED, Json(json!({ "loan": loan }))).into_response()
        }
        Err(e) => map_loan_error(&e),
    }
}

/// GET `/groups/{group_id}/loans` - List a group's loans.
async fn list_loans(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListLoansQuery>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let filter = LoanFilter {
        user_id: query.user_id,
        status: query.status,
    };

    match repo
        .list_for_group(group_id, filter, page.offset(), page.limit())
        .await
    {
        Ok((rows, total)) => {
            let rows: Vec<serde_json::Value> = rows.iter().map(loan_json).collect();
            Json(PageResponse::new(rows, page.page, page.per_page, total)).into_response()
        }
        Err(e) => map_loan_error(&e),
    }
}

/// GET `/groups/{group_id}/loans/stats` - Aggregate loan figures.
async fn loan_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let stats = match repo.group_stats(group_id).await {
        Ok(stats) => stats,
        Err(e) => return map_loan_error(&e),
    };

    let group_repo = GroupRepository::new((*state.db).clone());
    match group_repo.balance_summary(group_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "total_granted": stats.total_granted,
                "outstanding_principal": stats.outstanding_principal,
                "total_repaid": stats.total_repaid,
                "pending_count": stats.pending_count,
                "active_count": stats.active_count,
                "repaid_count": stats.repaid_count,
                "available_loan_funds": summary.available_loan_funds,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to compute balance summary");
            access::internal_error()
        }
    }
}

/// GET `/loans/{loan_id}` - Fetch a loan with its repayment schedule.
async fn get_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(loan_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let with_schedule = match repo.find_with_schedule(loan_id).await {
        Ok(Some(with_schedule)) => with_schedule,
        Ok(None) => return loan_not_found(loan_id),
        Err(e) => return map_loan_error(&e),
    };

    if let Err(response) =
        access::require_member(&state.db, with_schedule.loan.group_id, &auth).await
    {
        return response;
    }

    let schedule = with_schedule.amortization.as_ref().map(|a| {
        a.schedule
            .iter()
            .map(|entry| {
                json!({
                    "period": entry.period,
                    "due_date": entry.due_date,
                    "amount": entry.amount,
                    "cumulative": entry.cumulative,
                    "remaining": entry.remaining,
                })
            })
            .collect::<Vec<_>>()
    });

    let mut body = loan_json(&with_schedule.loan);
    if let Some(map) = body.as_object_mut() {
        map.insert("schedule".to_string(), json!(schedule));
    }

    (StatusCode::OK, Json(json!({ "loan": body }))).into_response()
}

/// POST `/loans/{loan_id}/approve` - Approve and disburse.
async fn approve_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(loan_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let Some(group_id) = loan_group(&repo, loan_id).await else {
        return loan_not_found(loan_id);
    };
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }

    match repo.approve(loan_id, auth.user_id()).await {
        Ok(loan) => {
            info!(loan_id = %loan.id, principal = %loan.principal, "Loan approved");
            (StatusCode::OK, Json(json!({ "loan": loan_json(&loan) }))).into_response()
        }
        Err(e) => map_loan_error(&e),
    }
}

/// POST `/loans/{loan_id}/reject` - Reject a pending request.
async fn reject_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(loan_id): Path<Uuid>,
    Json(payload): Json<RejectLoanRequest>,
) -> impl IntoResponse {
    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let Some(group_id) = loan_group(&repo, loan_id).await else {
        return loan_not_found(loan_id);
    };
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
        return response;
    }
    if let Err(e) = payload.validate() {
        return access::validation_failed(&e);
    }

    match repo.reject(loan_id, auth.user_id(), &payload.reason).await {
        Ok(loan) => {
            info!(loan_id = %loan.id, "Loan rejected");
            (StatusCode::OK, Json(json!({ "loan": loan_json(&loan) }))).into_response()
        }
        Err(e) => map_loan_error(&e),
    }
}

/// POST `/loans/{loan_id}/repay` - Record a repayment.
async fn repay_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(loan_id): Path<Uuid>,
    Json(payload): Json<RepayLoanRequest>,
) -> impl IntoResponse {
    let repo = LoanRepository::new((*state.db).clone(), state.loan_rules);
    let with_schedule = match repo.find_with_schedule(loan_id).await {
        Ok(Some(with_schedule)) => with_schedule,
        Ok(None) => return loan_not_found(loan_id),
        Err(e) => return map_loan_error(&e),
    };
    let loan = &with_schedule.loan;

    // The borrower repays their own loan; treasurers record for anyone.
    if loan.user_id == auth.user_id() {
        if let Err(response) = access::require_member(&state.db, loan.group_id, &auth).await {
            return response;
        }
    } else if let Err(response) =
        access::require_fund_manager(&state.db, loan.group_id, &auth).await
    {
        return response;
    }

    if !is_valid_amount(payload.amount) {
        return invalid_amount(payload.amount);
    }

    let method = payload.payment_method.unwrap_or(PaymentMethod::Cash);
    match repo
        .repay(loan_id, round_amount(payload.amount), method, auth.user_id())
        .await
    {
        Ok(loan) => {
            info!(
                loan_id = %loan.id,
                amount_repaid = %loan.amount_repaid,
                "Repayment recorded"
            );
            (StatusCode::OK, Json(json!({ "loan": loan_json(&loan) }))).into_response()
        }
        Err(e) => map_loan_error(&e),
    }
}

/// Serializes a loan with its derived remaining amount and progression.
fn loan_json(loan: &loans::Model) -> serde_json::Value {
    let remaining = loan.total_payable - loan.amount_repaid;
    let progression = progression_percent(loan.amount_repaid, loan.total_payable);

    let mut value = json!(loan);
    if let Some(map) = value.as_object_mut() {
        map.insert("remaining".to_string(), json!(remaining));
        map.insert("progression_percent".to_string(), json!(progression));
    }
    value
}

/// How far along the repayment is, in percent with one fraction digit.
fn progression_percent(amount_repaid: Decimal, total_payable: Decimal) -> Decimal {
    if total_payable.is_zero() {
        Decimal::ZERO
    } else {
        (amount_repaid * Decimal::ONE_HUNDRED / total_payable).round_dp(1)
    }
}

async fn loan_group(repo: &LoanRepository, loan_id: Uuid) -> Option<Uuid> {
    repo.find_with_schedule(loan_id)
        .await
        .ok()
        .flatten()
        .map(|l| l.loan.group_id)
}

fn map_loan_error(e: &LoanRepoError) -> axum::response::Response {
    let (status, code, message) = match e {
        LoanRepoError::GroupNotFound(id) => (
            StatusCode::NOT_FOUND,
            "group_not_found",
            format!("Group not found: {id}"),
        ),
        LoanRepoError::GroupNotActive => (
            StatusCode::CONFLICT,
            "group_not_active",
            "Group is not active".to_string(),
        ),
        LoanRepoError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            "loan_not_found",
            format!("Loan not found: {id}"),
        ),
        LoanRepoError::Rule(rule) => {
            let code = match rule {
                LoanError::InvalidPrincipal(_) | LoanError::BelowMinimum { .. } => {
                    "invalid_principal"
                }
                LoanError::InvalidTerm { .. } => "invalid_term",
                LoanError::InvalidRate(_) => "invalid_rate",
                LoanError::BorrowerNotActive => "borrower_not_active",
                LoanError::OutstandingLoanExists => "outstanding_loan_exists",
                LoanError::InsufficientFunds { .. } => "insufficient_funds",
                LoanError::InvalidTransition { .. } => "invalid_transition",
                LoanError::MissingRejectionReason => "missing_rejection_reason",
                LoanError::NotRepayable(_) => "not_repayable",
                LoanError::InvalidRepaymentAmount(_) => "invalid_repayment_amount",
            };
            (StatusCode::UNPROCESSABLE_ENTITY, code, rule.to_string())
        }
        LoanRepoError::Balance(rule) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_balance",
            rule.to_string(),
        ),
        LoanRepoError::Database(e) => {
            error!(error = %e, "Loan operation failed");
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

fn loan_not_found(id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "loan_not_found",
            "message": format!("Loan not found: {id}")
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), dec!(55_000), dec!(0))]
    #[case(dec!(27_500), dec!(55_000), dec!(50.0))]
    #[case(dec!(55_000), dec!(55_000), dec!(100.0))]
    #[case(dec!(4583.33), dec!(55_000), dec!(8.3))]
    fn test_progression_percent(
        #[case] repaid: Decimal,
        #[case] total: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(progression_percent(repaid, total), expected);
    }

    #[test]
    fn test_progression_of_zero_total_is_zero() {
        assert_eq!(progression_percent(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }
}
