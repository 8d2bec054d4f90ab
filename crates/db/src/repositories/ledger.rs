//! Ledger repository for the append-only transactions table.
//!
//! The ledger is written from inside the contribution and loan
//! repositories' transactions via `append_in_txn`; this repository
//! additionally offers read access and the audit recomputation.
//! Pending mobile-money rows are settled by the contribution
//! repository inside the same transaction as the balance effect;
//! [`LedgerRepository::resolve_pending`] covers only rows with no
//! linked contribution. There is no other update and no delete, ever.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use twungurane_core::group::{self, BalanceEvent};
use twungurane_core::ledger::{generate_reference, TransactionKind, TransactionSource};

use crate::entities::{
    sea_orm_active_enums::{DbTransactionStatus, DbTransactionType},
    transactions,
};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Transaction not found by reference.
    #[error("Transaction not found: {0}")]
    NotFound(String),

    /// Transaction is not pending, so its status cannot be resolved.
    #[error("Transaction '{0}' is not pending")]
    NotPending(String),

    /// Recorded history violates the balance invariant.
    #[error("Ledger history is inconsistent: {0}")]
    InconsistentHistory(#[from] group::BalanceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A ledger entry to append, produced by a money-moving operation.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    /// Group the money moved in.
    pub group_id: Uuid,
    /// Member the money moved for.
    pub user_id: Uuid,
    /// Amount; always positive, direction comes from the kind.
    pub amount: Decimal,
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Payment channel or `internal`.
    pub source: TransactionSource,
    /// Settlement status to record.
    pub status: DbTransactionStatus,
    /// Human-readable description.
    pub description: String,
    /// Linked ids and external references.
    pub metadata: serde_json::Value,
    /// Date the money moved; stored on the row and in the reference.
    pub date: NaiveDate,
}

/// Extracts the linked contribution id from a ledger row's metadata.
///
/// Rows written for a contribution carry `contribution_id` so the
/// settlement path can find its pending ledger row again.
#[must_use]
pub fn linked_contribution_id(metadata: &serde_json::Value) -> Option<Uuid> {
    metadata
        .get("contribution_id")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Filter options for listing ledger transactions.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Filter by member.
    pub user_id: Option<Uuid>,
    /// Filter by kind.
    pub kind: Option<TransactionKind>,
    /// Filter by date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Filter by date range end (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// Ledger repository for append and read access.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends a ledger entry inside an open transaction.
    ///
    /// Called by the contribution and loan repositories so the entry
    /// commits or rolls back together with the balance update that
    /// motivated it.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_in_txn<C: ConnectionTrait>(
        conn: &C,
        entry: NewLedgerEntry,
    ) -> Result<transactions::Model, DbErr> {
        let now = Utc::now().into();
        let row = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            reference: Set(generate_reference(entry.kind, entry.date)),
            group_id: Set(entry.group_id),
            user_id: Set(entry.user_id),
            amount: Set(entry.amount),
            transaction_type: Set(entry.kind.into()),
            source: Set(entry.source.into()),
            status: Set(entry.status),
            description: Set(entry.description),
            transaction_date: Set(entry.date),
            metadata: Set(entry.metadata),
            created_at: Set(now),
            updated_at: Set(now),
        };
        row.insert(conn).await
    }

    /// Lists a group's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_group(
        &self,
        group_id: Uuid,
        filter: LedgerFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<transactions::Model>, u64), LedgerError> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::GroupId.eq(group_id));

        if let Some(user_id) = filter.user_id {
            query = query.filter(transactions::Column::UserId.eq(user_id));
        }
        if let Some(kind) = filter.kind {
            query = query
                .filter(transactions::Column::TransactionType.eq(DbTransactionType::from(kind)));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Finds a transaction by its unique reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<transactions::Model>, LedgerError> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::Reference.eq(reference))
            .one(&self.db)
            .await?)
    }

    /// Resolves a pending transaction that carries no linked
    /// contribution.
    ///
    /// Rows linked to a contribution are settled by the contribution
    /// repository inside the transaction that applies their balance
    /// effect; this method only covers the remaining case. The channel
    /// reference and failure detail are merged into the metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is unknown or not pending.
    pub async fn resolve_pending(
        &self,
        reference: &str,
        status: DbTransactionStatus,
        channel_reference: &str,
        detail: Option<String>,
    ) -> Result<transactions::Model, LedgerError> {
        let row = self
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| LedgerError::NotFound(reference.to_string()))?;

        if row.status != DbTransactionStatus::Pending {
            return Err(LedgerError::NotPending(reference.to_string()));
        }

        let mut metadata = row.metadata.clone();
        if let Some(map) = metadata.as_object_mut() {
            map.insert("channel_reference".to_string(), json!(channel_reference));
            if let Some(detail) = detail {
                map.insert("failure_detail".to_string(), json!(detail));
            }
        }

        let mut active: transactions::ActiveModel = row.into();
        active.status = Set(status);
        active.metadata = Set(metadata);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Recomputes a group's balance from its full ledger history.
    ///
    /// Used as an audit check against the maintained aggregate; only
    /// completed transactions count.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentHistory` if replaying the ledger would ever
    /// drive the balance negative.
    pub async fn recompute_group_balance(&self, group_id: Uuid) -> Result<Decimal, LedgerError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::GroupId.eq(group_id))
            .filter(transactions::Column::Status.eq(DbTransactionStatus::Completed))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let events = rows
            .iter()
            .map(|row| balance_event(row.transaction_type.into(), row.amount));

        Ok(group::recompute(events)?)
    }
}

/// Maps a ledger transaction to its balance event. Withdrawals and
/// disbursements take money out of the pot; everything else puts money
/// in.
fn balance_event(kind: TransactionKind, amount: Decimal) -> BalanceEvent {
    match kind {
        TransactionKind::Withdrawal | TransactionKind::LoanDisbursement => {
            BalanceEvent::Debit(amount)
        }
        TransactionKind::ContributionSavings
        | TransactionKind::ContributionPenalty
        | TransactionKind::ContributionInterest
        | TransactionKind::ContributionFee
        | TransactionKind::LoanRepayment => BalanceEvent::Credit(amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_event_directions() {
        assert_eq!(
            balance_event(TransactionKind::LoanDisbursement, dec!(50_000)),
            BalanceEvent::Debit(dec!(50_000))
        );
        assert_eq!(
            balance_event(TransactionKind::Withdrawal, dec!(1000)),
            BalanceEvent::Debit(dec!(1000))
        );
        assert_eq!(
            balance_event(TransactionKind::LoanRepayment, dec!(55_000)),
            BalanceEvent::Credit(dec!(55_000))
        );
        assert_eq!(
            balance_event(TransactionKind::ContributionSavings, dec!(5000)),
            BalanceEvent::Credit(dec!(5000))
        );
    }

    #[test]
    fn test_linked_contribution_id_recovery() {
        let id = Uuid::new_v4();
        let metadata = json!({ "contribution_id": id, "loan_id": null });
        assert_eq!(linked_contribution_id(&metadata), Some(id));

        assert_eq!(linked_contribution_id(&json!({})), None);
        assert_eq!(linked_contribution_id(&json!({ "contribution_id": 7 })), None);
        assert_eq!(
            linked_contribution_id(&json!({ "contribution_id": "not-a-uuid" })),
            None
        );
    }

    #[test]
    fn test_disburse_then_repay_round_trip() {
        let events = [
            balance_event(TransactionKind::ContributionSavings, dec!(100_000)),
            balance_event(TransactionKind::LoanDisbursement, dec!(50_000)),
            balance_event(TransactionKind::LoanRepayment, dec!(55_000)),
        ];
        assert_eq!(group::recompute(events).unwrap(), dec!(105_000));
    }
}
