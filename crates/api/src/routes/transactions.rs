//! Ledger routes: history, lookup by reference, balance audit.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::access};
use twungurane_core::ledger::TransactionKind;
use twungurane_db::LedgerRepository;
use twungurane_db::repositories::group::GroupRepository;
use twungurane_db::repositories::ledger::{LedgerError, LedgerFilter};
use twungurane_shared::types::{PageRequest, PageResponse};

/// Creates the ledger routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/transactions", get(list_transactions))
        .route("/groups/{group_id}/transactions/audit", get(audit_balance))
        .route("/transactions/{reference}", get(get_transaction))
}

/// Query parameters for listing ledger transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by member.
    pub user_id: Option<Uuid>,
    /// Filter by kind.
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    /// Start of the date range (inclusive).
    pub from: Option<NaiveDate>,
    /// End of the date range (inclusive).
    pub to: Option<NaiveDate>,
}

/// GET `/groups/{group_id}/transactions` - A group's ledger history.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListTransactionsQuery>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    if let Err(response) = access::require_member(&state.db, group_id, &auth).await {
        return response;
    }

    let repo = LedgerRepository::new((*state.db).clone());
    let filter = LedgerFilter {
        user_id: query.user_id,
        kind: query.kind,
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
        Err(e) => map_ledger_error(&e),
    }
}

/// GET `/groups/{group_id}/transactions/audit` - Compare the maintained
/// balance against a full ledger replay.
async fn audit_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = access::require_fund_manager(&state.db, group_id, &auth).await {
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

    let ledger_repo = LedgerRepository::new((*state.db).clone());
    match ledger_repo.recompute_group_balance(group_id).await {
        Ok(recomputed) => {
            let consistent = recomputed == group.balance;
            if !consistent {
                warn!(
                    group_id = %group_id,
                    stored = %group.balance,
                    recomputed = %recomputed,
                    "Ledger audit mismatch"
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "stored_balance": group.balance,
                    "recomputed_balance": recomputed,
                    "consistent": consistent,
                })),
            )
                .into_response()
        }
        Err(e) => map_ledger_error(&e),
    }
}

/// GET `/transactions/{reference}` - Look a transaction up by reference.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());
    let transaction = match repo.find_by_reference(&reference).await {
        Ok(Some(transaction)) => transaction,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "transaction_not_found",
                    "message": format!("Transaction not found: {reference}")
                })),
            )
                .into_response();
        }
        Err(e) => return map_ledger_error(&e),
    };

    if let Err(response) =
        access::require_member(&state.db, transaction.group_id, &auth).await
    {
        return response;
    }

    (StatusCode::OK, Json(json!({ "transaction": transaction }))).into_response()
}

fn map_ledger_error(e: &LedgerError) -> axum::response::Response {
    match e {
        LedgerError::NotFound(reference) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "transaction_not_found",
                "message": format!("Transaction not found: {reference}")
            })),
        )
            .into_response(),
        LedgerError::NotPending(reference) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "not_pending",
                "message": format!("Transaction '{reference}' is not pending")
            })),
        )
            .into_response(),
        LedgerError::InconsistentHistory(e) => {
            error!(error = %e, "Ledger history is inconsistent");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "inconsistent_ledger",
                    "message": "Ledger history is inconsistent"
                })),
            )
                .into_response()
        }
        LedgerError::Database(e) => {
            error!(error = %e, "Ledger operation failed");
            access::internal_error()
        }
    }
}
