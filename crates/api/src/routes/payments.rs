//! Mobile-money gateway callback.
//!
//! The gateway posts the final status of an initiated collection or
//! disbursement here. Settlement is driven through the contribution
//! repository, which validates or cancels the linked contribution and
//! resolves the pending ledger row in one transaction; a failure
//! leaves the row pending so the gateway's retry can settle it. No
//! bearer auth: the gateway is trusted at the network layer.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{AppState, routes::access};
use twungurane_core::contribution::ContributionError;
use twungurane_db::LedgerRepository;
use twungurane_db::entities::sea_orm_active_enums::DbTransactionStatus;
use twungurane_db::repositories::contribution::{
    ChannelReceipt, ContributionRepoError, ContributionRepository,
};
use twungurane_db::repositories::ledger::{LedgerError, linked_contribution_id};
use twungurane_shared::clients::payments::PaymentCallback;

/// Creates the public payment callback route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments/callback", post(payment_callback))
}

/// POST `/payments/callback` - Resolve a pending mobile-money operation.
async fn payment_callback(
    State(state): State<AppState>,
    Json(payload): Json<PaymentCallback>,
) -> impl IntoResponse {
    let completed = match payload.status.as_str() {
        "completed" => true,
        "failed" => false,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!("Unknown callback status '{other}'")
                })),
            )
                .into_response();
        }
    };

    let ledger_repo = LedgerRepository::new((*state.db).clone());
    let transaction = match ledger_repo.find_by_reference(&payload.reference).await {
        Ok(Some(transaction)) => transaction,
        Ok(None) => {
            warn!(reference = %payload.reference, "Callback for unknown transaction");
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "transaction_not_found",
                    "message": format!("Transaction not found: {}", payload.reference)
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to look up transaction");
            return access::internal_error();
        }
    };

    if transaction.status != DbTransactionStatus::Pending {
        // Gateways retry; a second callback is acknowledged without
        // applying anything twice.
        info!(reference = %payload.reference, "Callback for already resolved transaction");
        return (StatusCode::OK, Json(json!({ "status": "already_resolved" }))).into_response();
    }

    let receipt = ChannelReceipt {
        channel_reference: payload.channel_reference.clone(),
        detail: payload.detail.clone(),
    };

    if let Some(contribution_id) = linked_contribution_id(&transaction.metadata) {
        // Contribution and ledger row settle in one transaction.
        let repo = ContributionRepository::new(
            (*state.db).clone(),
            state.contribution_rules,
            state.loan_rules,
        );
        let outcome = if completed {
            repo.validate(contribution_id, transaction.user_id, Some(receipt))
                .await
        } else {
            repo.cancel(contribution_id, Some(receipt)).await
        };

        match outcome {
            Ok(_) => {}
            Err(ContributionRepoError::Rule(ContributionError::NotPending)) => {
                info!(reference = %payload.reference, "Callback raced an earlier settlement");
                return (StatusCode::OK, Json(json!({ "status": "already_resolved" })))
                    .into_response();
            }
            Err(ContributionRepoError::Database(e)) => {
                error!(
                    contribution_id = %contribution_id,
                    error = %e,
                    "Failed to settle contribution from callback"
                );
                return access::internal_error();
            }
            Err(e) => {
                // The transaction stays pending for a later retry or a
                // manual cancellation.
                error!(
                    contribution_id = %contribution_id,
                    error = %e,
                    "Settlement refused"
                );
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "settlement_failed",
                        "message": e.to_string()
                    })),
                )
                    .into_response();
            }
        }
    } else {
        // No linked contribution; resolve the ledger row alone.
        let result = ledger_repo
            .resolve_pending(
                &payload.reference,
                if completed {
                    DbTransactionStatus::Completed
                } else {
                    DbTransactionStatus::Failed
                },
                &payload.channel_reference,
                payload.detail.clone(),
            )
            .await;
        match result {
            Ok(_) => {}
            Err(LedgerError::NotPending(reference)) => {
                info!(reference, "Callback raced an earlier settlement");
                return (StatusCode::OK, Json(json!({ "status": "already_resolved" })))
                    .into_response();
            }
            Err(e) => {
                error!(error = %e, "Failed to resolve transaction");
                return access::internal_error();
            }
        }
    }

    info!(
        reference = %payload.reference,
        completed,
        "Payment callback processed"
    );

    (StatusCode::OK, Json(json!({ "status": "resolved" }))).into_response()
}
