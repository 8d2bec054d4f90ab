//! Contribution repository.
//!
//! Recording a contribution, validating a pending one, and reversing a
//! validated repayment each run in one database transaction with the
//! group row (and loan row, for repayments) locked `FOR UPDATE`. Row
//! locks are always taken group first, then loan; the loan repository
//! follows the same order. The pure rules live in
//! `twungurane_core::contribution`; this module resolves the facts
//! those rules need and applies the agreed effects to the group
//! balance, the member's savings total, the loan and the ledger
//! atomically. Settling a pending mobile-money contribution flips its
//! pending ledger row in the same transaction, so the ledger replay and
//! the maintained balance can never disagree.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use twungurane_core::contribution::{
    BalanceEffect, ContributionError, ContributionService, ContributionStatus, ContributionType,
    NewContribution, PaymentMethod, RepaymentTarget,
};
use twungurane_core::group::{self, BalanceEvent};
use twungurane_core::ledger::{TransactionKind, TransactionSource};
use twungurane_core::loan::{LoanError, LoanService, LoanStatus};

use crate::entities::{
    contributions, group_members, groups, loans,
    sea_orm_active_enums::{
        DbContributionStatus, DbContributionType, DbGroupStatus, DbLoanStatus, DbMemberStatus,
        DbPaymentMethod, DbTransactionStatus,
    },
    transactions,
};
use crate::repositories::ledger::{LedgerRepository, NewLedgerEntry, linked_contribution_id};

/// Error types for contribution operations.
#[derive(Debug, thiserror::Error)]
pub enum ContributionRepoError {
    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Group is not accepting money movements.
    #[error("Group is not active")]
    GroupNotActive,

    /// Contribution not found.
    #[error("Contribution not found: {0}")]
    NotFound(Uuid),

    /// Referenced loan not found.
    #[error("Loan not found: {0}")]
    LoanNotFound(Uuid),

    /// A contribution rule was violated.
    #[error(transparent)]
    Rule(#[from] ContributionError),

    /// A loan rule was violated while applying a repayment.
    #[error(transparent)]
    Loan(#[from] LoanError),

    /// The balance invariant would be violated.
    #[error(transparent)]
    Balance(#[from] group::BalanceError),

    /// Deleting a validated contribution requires a privileged caller.
    #[error("Only privileged callers may reverse a validated repayment")]
    ReversalNotAllowed,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording a contribution.
#[derive(Debug, Clone)]
pub struct RecordContributionInput {
    /// Group the contribution belongs to.
    pub group_id: Uuid,
    /// Paying (or withdrawing) member.
    pub user_id: Uuid,
    /// Loan being repaid; required for repayment contributions.
    pub loan_id: Option<Uuid>,
    /// Amount in FBU.
    pub amount: Decimal,
    /// Kind of contribution.
    pub contribution_type: ContributionType,
    /// Payment channel.
    pub payment_method: PaymentMethod,
    /// Date the money changed hands.
    pub contribution_date: NaiveDate,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// User recording the contribution.
    pub recorded_by: Uuid,
}

/// Input for updating a pending contribution.
#[derive(Debug, Clone, Default)]
pub struct UpdateContributionInput {
    /// Amount.
    pub amount: Option<Decimal>,
    /// Payment channel.
    pub payment_method: Option<PaymentMethod>,
    /// Date the money changed hands.
    pub contribution_date: Option<NaiveDate>,
    /// Notes.
    pub notes: Option<Option<String>>,
}

/// Filter options for listing contributions.
#[derive(Debug, Clone, Default)]
pub struct ContributionFilter {
    /// Filter by member.
    pub user_id: Option<Uuid>,
    /// Filter by kind.
    pub contribution_type: Option<ContributionType>,
    /// Filter by status.
    pub status: Option<ContributionStatus>,
    /// Filter by payment channel.
    pub payment_method: Option<PaymentMethod>,
    /// Filter by date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Filter by date range end (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// Aggregate figures over a group's validated contributions.
#[derive(Debug, Clone, Default)]
pub struct ContributionStats {
    /// Sum of validated savings.
    pub total_savings: Decimal,
    /// Sum of validated penalties.
    pub total_penalties: Decimal,
    /// Sum of validated interest contributions.
    pub total_interest: Decimal,
    /// Sum of validated loan repayments.
    pub total_repayments: Decimal,
    /// Validated savings dated in the current month.
    pub savings_this_month: Decimal,
}

/// Channel-side identifiers delivered by the gateway callback.
#[derive(Debug, Clone)]
pub struct ChannelReceipt {
    /// Gateway-side reference of the payment.
    pub channel_reference: String,
    /// Failure detail, for failed payments.
    pub detail: Option<String>,
}

/// A recorded contribution, with the ledger reference awaiting the
/// gateway callback when the payment settles through mobile money.
#[derive(Debug, Clone)]
pub struct RecordedContribution {
    /// The stored contribution row.
    pub contribution: contributions::Model,
    /// Reference of the pending ledger transaction, if any.
    pub pending_reference: Option<String>,
}

/// Contribution repository.
#[derive(Debug, Clone)]
pub struct ContributionRepository {
    db: DatabaseConnection,
    rules: ContributionService,
    loan_rules: LoanService,
}

impl ContributionRepository {
    /// Creates a new contribution repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        rules: ContributionService,
        loan_rules: LoanService,
    ) -> Self {
        Self {
            db,
            rules,
            loan_rules,
        }
    }

    /// Records a contribution.
    ///
    /// Cash and bank contributions are validated immediately and their
    /// effects applied. Mobile-money contributions are stored pending
    /// together with a pending ledger row; the gateway callback later
    /// validates or cancels them.
    ///
    /// # Errors
    ///
    /// Returns an error for inactive groups or members, rule
    /// violations, unknown loans, or overdraws.
    pub async fn record(
        &self,
        input: RecordContributionInput,
    ) -> Result<RecordedContribution, ContributionRepoError> {
        let txn = self.db.begin().await?;

        let group = Self::lock_group(&txn, input.group_id).await?;
        if group.status != DbGroupStatus::Active {
            return Err(ContributionRepoError::GroupNotActive);
        }

        let membership = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(input.group_id))
            .filter(group_members::Column::UserId.eq(input.user_id))
            .one(&txn)
            .await?;
        let member_is_active = membership
            .as_ref()
            .is_some_and(|m| m.status == DbMemberStatus::Active);

        let loan = match input.loan_id {
            Some(loan_id) => Some(Self::lock_loan(&txn, loan_id).await?),
            None => None,
        };
        let repayment_target = loan.as_ref().map(|loan| RepaymentTarget {
            belongs_to_member: loan.user_id == input.user_id,
            belongs_to_group: loan.group_id == input.group_id,
            is_repayable: LoanStatus::from(loan.status).is_repayable(),
        });

        self.rules.validate_new(
            &NewContribution {
                contribution_type: input.contribution_type,
                amount: input.amount,
                contribution_date: input.contribution_date,
            },
            member_is_active,
            Utc::now().date_naive(),
            repayment_target,
        )?;

        // Repayments are clamped to the outstanding balance up front so
        // the stored amount matches what the loan will accept.
        let amount = match (&loan, input.contribution_type) {
            (Some(loan), ContributionType::Repayment) => {
                input.amount.min(loan.total_payable - loan.amount_repaid)
            }
            _ => input.amount,
        };

        let settles_later = input.payment_method.is_mobile_money();
        let now = Utc::now();
        let contribution_id = Uuid::new_v4();

        let row = contributions::ActiveModel {
            id: Set(contribution_id),
            group_id: Set(input.group_id),
            user_id: Set(input.user_id),
            loan_id: Set(input.loan_id),
            amount: Set(amount),
            contribution_type: Set(DbContributionType::from(input.contribution_type)),
            payment_method: Set(DbPaymentMethod::from(input.payment_method)),
            contribution_date: Set(input.contribution_date),
            notes: Set(input.notes),
            status: Set(if settles_later {
                DbContributionStatus::Pending
            } else {
                DbContributionStatus::Validated
            }),
            validated_by: Set((!settles_later).then_some(input.recorded_by)),
            validated_at: Set((!settles_later).then(|| now.into())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let contribution = row.insert(&txn).await?;

        let pending_reference = if settles_later {
            // No balance effect yet; the callback settles it.
            let entry = LedgerRepository::append_in_txn(
                &txn,
                Self::ledger_entry(&contribution, DbTransactionStatus::Pending),
            )
            .await?;
            Some(entry.reference)
        } else {
            self.apply_effects(&txn, &group, &contribution, membership)
                .await?;
            LedgerRepository::append_in_txn(
                &txn,
                Self::ledger_entry(&contribution, DbTransactionStatus::Completed),
            )
            .await?;
            None
        };

        txn.commit().await?;
        Ok(RecordedContribution {
            contribution,
            pending_reference,
        })
    }

    /// Validates a pending contribution, applying its effects.
    ///
    /// Used by the gateway callback (which supplies the channel
    /// receipt) and by treasurers validating manually recorded
    /// contributions. The linked pending ledger row, where one exists,
    /// is completed in the same transaction, at the amount the loan
    /// actually accepted for repayments; that amount is also written
    /// back to the contribution so all three records agree.
    ///
    /// # Errors
    ///
    /// Returns an error if the contribution is unknown or not pending.
    pub async fn validate(
        &self,
        contribution_id: Uuid,
        validated_by: Uuid,
        receipt: Option<ChannelReceipt>,
    ) -> Result<contributions::Model, ContributionRepoError> {
        let txn = self.db.begin().await?;

        let contribution = contributions::Entity::find_by_id(contribution_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ContributionRepoError::NotFound(contribution_id))?;
        self.rules.ensure_mutable(contribution.status.into())?;

        let group = Self::lock_group(&txn, contribution.group_id).await?;
        let membership = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(contribution.group_id))
            .filter(group_members::Column::UserId.eq(contribution.user_id))
            .one(&txn)
            .await?;

        let applied = self
            .apply_effects(&txn, &group, &contribution, membership)
            .await?;

        Self::resolve_linked_entry(
            &txn,
            &contribution,
            DbTransactionStatus::Completed,
            Some(applied),
            receipt.as_ref(),
        )
        .await?;

        let now = Utc::now().into();
        let mut active: contributions::ActiveModel = contribution.into();
        // A repayment may settle below the recorded amount when the
        // outstanding shrank while the payment was in flight.
        active.amount = Set(applied);
        active.status = Set(DbContributionStatus::Validated);
        active.validated_by = Set(Some(validated_by));
        active.validated_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Cancels a pending contribution (e.g. after a failed payment).
    ///
    /// The linked pending ledger row, where one exists, is marked
    /// failed in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the contribution is unknown or not pending.
    pub async fn cancel(
        &self,
        contribution_id: Uuid,
        receipt: Option<ChannelReceipt>,
    ) -> Result<contributions::Model, ContributionRepoError> {
        let txn = self.db.begin().await?;

        let contribution = contributions::Entity::find_by_id(contribution_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ContributionRepoError::NotFound(contribution_id))?;
        self.rules.ensure_mutable(contribution.status.into())?;

        Self::resolve_linked_entry(
            &txn,
            &contribution,
            DbTransactionStatus::Failed,
            None,
            receipt.as_ref(),
        )
        .await?;

        let mut active: contributions::ActiveModel = contribution.into();
        active.status = Set(DbContributionStatus::Cancelled);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Updates a pending contribution.
    ///
    /// # Errors
    ///
    /// Returns `Rule(NotPending)` once the contribution has been
    /// validated or cancelled, and re-validates a changed amount.
    pub async fn update(
        &self,
        contribution_id: Uuid,
        input: UpdateContributionInput,
    ) -> Result<contributions::Model, ContributionRepoError> {
        let contribution = contributions::Entity::find_by_id(contribution_id)
            .one(&self.db)
            .await?
            .ok_or(ContributionRepoError::NotFound(contribution_id))?;
        self.rules.ensure_mutable(contribution.status.into())?;

        if let Some(amount) = input.amount {
            self.rules.validate_amount(amount)?;
        }
        if let Some(date) = input.contribution_date
            && date > Utc::now().date_naive()
        {
            return Err(ContributionError::FutureDate(date).into());
        }

        let mut active: contributions::ActiveModel = contribution.into();
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(method) = input.payment_method {
            active.payment_method = Set(method.into());
        }
        if let Some(date) = input.contribution_date {
            active.contribution_date = Set(date);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a contribution.
    ///
    /// Pending contributions are deleted outright. A validated
    /// repayment can be reversed by a privileged caller: the loan's
    /// `amount_repaid` is decremented, the group balance debited, and
    /// the contribution kept as `cancelled` for the audit trail.
    ///
    /// # Errors
    ///
    /// Returns `ReversalNotAllowed` for validated contributions without
    /// the privileged flag, and `Rule(NotPending)` for validated
    /// non-repayment contributions.
    pub async fn delete(
        &self,
        contribution_id: Uuid,
        privileged: bool,
    ) -> Result<(), ContributionRepoError> {
        let txn = self.db.begin().await?;

        let contribution = contributions::Entity::find_by_id(contribution_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ContributionRepoError::NotFound(contribution_id))?;

        match contribution.status {
            DbContributionStatus::Pending => {
                // An abandoned mobile-money payment leaves a pending
                // ledger row behind; fail it alongside the delete.
                Self::resolve_linked_entry(
                    &txn,
                    &contribution,
                    DbTransactionStatus::Failed,
                    None,
                    None,
                )
                .await?;
                contributions::Entity::delete_by_id(contribution_id)
                    .exec(&txn)
                    .await?;
                txn.commit().await?;
                Ok(())
            }
            DbContributionStatus::Validated
                if contribution.contribution_type == DbContributionType::Repayment =>
            {
                if !privileged {
                    return Err(ContributionRepoError::ReversalNotAllowed);
                }
                self.reverse_repayment(&txn, &contribution).await?;
                let mut active: contributions::ActiveModel = contribution.into();
                active.status = Set(DbContributionStatus::Cancelled);
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?;
                txn.commit().await?;
                Ok(())
            }
            _ => Err(ContributionError::NotPending.into()),
        }
    }

    /// Lists a group's contributions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_group(
        &self,
        group_id: Uuid,
        filter: ContributionFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<contributions::Model>, u64), ContributionRepoError> {
        let mut query =
            contributions::Entity::find().filter(contributions::Column::GroupId.eq(group_id));

        if let Some(user_id) = filter.user_id {
            query = query.filter(contributions::Column::UserId.eq(user_id));
        }
        if let Some(kind) = filter.contribution_type {
            query = query.filter(
                contributions::Column::ContributionType.eq(DbContributionType::from(kind)),
            );
        }
        if let Some(status) = filter.status {
            query =
                query.filter(contributions::Column::Status.eq(DbContributionStatus::from(status)));
        }
        if let Some(method) = filter.payment_method {
            query = query
                .filter(contributions::Column::PaymentMethod.eq(DbPaymentMethod::from(method)));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(contributions::Column::ContributionDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(contributions::Column::ContributionDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(contributions::Column::ContributionDate)
            .order_by_desc(contributions::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Computes aggregate contribution figures for a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn group_stats(
        &self,
        group_id: Uuid,
    ) -> Result<ContributionStats, ContributionRepoError> {
        let rows = contributions::Entity::find()
            .filter(contributions::Column::GroupId.eq(group_id))
            .filter(contributions::Column::Status.eq(DbContributionStatus::Validated))
            .all(&self.db)
            .await?;

        let today = Utc::now().date_naive();
        let mut stats = ContributionStats::default();
        for row in &rows {
            match row.contribution_type {
                DbContributionType::Savings => {
                    stats.total_savings += row.amount;
                    if row.contribution_date.year() == today.year()
                        && row.contribution_date.month() == today.month()
                    {
                        stats.savings_this_month += row.amount;
                    }
                }
                DbContributionType::Penalty => stats.total_penalties += row.amount,
                DbContributionType::Interest => stats.total_interest += row.amount,
                DbContributionType::Repayment => stats.total_repayments += row.amount,
                DbContributionType::Fee | DbContributionType::Withdrawal => {}
            }
        }

        Ok(stats)
    }

    /// Finds a contribution by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<contributions::Model>, ContributionRepoError> {
        Ok(contributions::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Applies a validated contribution's effects: group balance,
    /// member savings total, and for repayments the loan state.
    ///
    /// Returns the amount actually applied, which for repayments may
    /// be clamped below the contribution amount.
    async fn apply_effects(
        &self,
        txn: &DatabaseTransaction,
        group: &groups::Model,
        contribution: &contributions::Model,
        membership: Option<group_members::Model>,
    ) -> Result<Decimal, ContributionRepoError> {
        let kind = ContributionType::from(contribution.contribution_type);

        // Repayments are clamped against the loan before any balance
        // effect, so the credited amount matches what the loan accepts.
        let effective_amount = if kind == ContributionType::Repayment {
            let loan_id = contribution
                .loan_id
                .ok_or(ContributionError::MissingLoanReference)?;
            let loan = Self::lock_loan(txn, loan_id).await?;
            let outcome = self.loan_rules.apply_repayment(
                loan.status.into(),
                loan.total_payable,
                loan.amount_repaid,
                contribution.amount,
            )?;

            let now = Utc::now().into();
            let repayment_count = loan.repayment_count;
            let mut active: loans::ActiveModel = loan.into();
            active.amount_repaid = Set(outcome.amount_repaid);
            active.repayment_count = Set(repayment_count + 1);
            active.status = Set(DbLoanStatus::from(outcome.next_status));
            if outcome.next_status == LoanStatus::Repaid {
                active.completed_at = Set(Some(now));
            }
            active.updated_at = Set(now);
            active.update(txn).await?;

            outcome.applied
        } else {
            contribution.amount
        };

        let event = match kind.balance_effect() {
            BalanceEffect::Credit => BalanceEvent::Credit(effective_amount),
            BalanceEffect::Debit => BalanceEvent::Debit(effective_amount),
        };
        let new_balance = group::apply_event(group.balance, event)?;

        let now = Utc::now().into();
        let mut group_active: groups::ActiveModel = group.clone().into();
        group_active.balance = Set(new_balance);
        group_active.updated_at = Set(now);
        group_active.update(txn).await?;

        if kind.counts_toward_member_total()
            && let Some(membership) = membership
        {
            let new_total = membership.total_savings + effective_amount;
            let mut member_active: group_members::ActiveModel = membership.into();
            member_active.total_savings = Set(new_total);
            member_active.updated_at = Set(now);
            member_active.update(txn).await?;
        }

        Ok(effective_amount)
    }

    /// Reverses a validated repayment's effects on loan and balance.
    async fn reverse_repayment(
        &self,
        txn: &DatabaseTransaction,
        contribution: &contributions::Model,
    ) -> Result<(), ContributionRepoError> {
        let loan_id = contribution
            .loan_id
            .ok_or(ContributionError::MissingLoanReference)?;
        let group = Self::lock_group(txn, contribution.group_id).await?;
        let loan = Self::lock_loan(txn, loan_id).await?;

        // The amount actually applied may have been clamped below the
        // contribution amount on the final installment.
        let reversed = contribution.amount.min(loan.amount_repaid);
        let new_balance = group::apply_event(group.balance, BalanceEvent::Debit(reversed))?;

        let now = Utc::now().into();
        let mut loan_active: loans::ActiveModel = loan.clone().into();
        loan_active.amount_repaid = Set(loan.amount_repaid - reversed);
        loan_active.repayment_count = Set((loan.repayment_count - 1).max(0));
        if loan.status == DbLoanStatus::Repaid {
            loan_active.status = Set(DbLoanStatus::Active);
            loan_active.completed_at = Set(None);
        }
        loan_active.updated_at = Set(now);
        loan_active.update(txn).await?;

        let mut group_active: groups::ActiveModel = group.into();
        group_active.balance = Set(new_balance);
        group_active.updated_at = Set(now);
        group_active.update(txn).await?;

        Ok(())
    }

    /// Settles the pending ledger row linked to a contribution inside
    /// the open transaction, so the ledger and the maintained balance
    /// commit or roll back together. Contributions settled immediately
    /// have no pending row; that is not an error.
    ///
    /// When `amount` is given it overwrites the row's amount, covering
    /// repayments whose applied amount was clamped at settlement time.
    async fn resolve_linked_entry(
        txn: &DatabaseTransaction,
        contribution: &contributions::Model,
        status: DbTransactionStatus,
        amount: Option<Decimal>,
        receipt: Option<&ChannelReceipt>,
    ) -> Result<(), DbErr> {
        let pending = transactions::Entity::find()
            .filter(transactions::Column::GroupId.eq(contribution.group_id))
            .filter(transactions::Column::Status.eq(DbTransactionStatus::Pending))
            .lock_exclusive()
            .all(txn)
            .await?;
        let Some(row) = pending
            .into_iter()
            .find(|row| linked_contribution_id(&row.metadata) == Some(contribution.id))
        else {
            return Ok(());
        };

        let mut metadata = row.metadata.clone();
        if let (Some(map), Some(receipt)) = (metadata.as_object_mut(), receipt) {
            map.insert(
                "channel_reference".to_string(),
                json!(receipt.channel_reference),
            );
            if let Some(detail) = &receipt.detail {
                map.insert("failure_detail".to_string(), json!(detail));
            }
        }

        let mut active: transactions::ActiveModel = row.into();
        if let Some(amount) = amount {
            active.amount = Set(amount);
        }
        active.status = Set(status);
        active.metadata = Set(metadata);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;
        Ok(())
    }

    fn ledger_entry(
        contribution: &contributions::Model,
        status: DbTransactionStatus,
    ) -> NewLedgerEntry {
        let kind =
            TransactionKind::from_contribution(contribution.contribution_type.into());
        NewLedgerEntry {
            group_id: contribution.group_id,
            user_id: contribution.user_id,
            amount: contribution.amount,
            kind,
            source: TransactionSource::from(PaymentMethod::from(contribution.payment_method)),
            status,
            description: format!(
                "{:?} contribution of {} FBU",
                ContributionType::from(contribution.contribution_type),
                contribution.amount
            ),
            metadata: json!({
                "contribution_id": contribution.id,
                "loan_id": contribution.loan_id,
            }),
            date: contribution.contribution_date,
        }
    }

    async fn lock_group(
        txn: &DatabaseTransaction,
        group_id: Uuid,
    ) -> Result<groups::Model, ContributionRepoError> {
        groups::Entity::find_by_id(group_id)
            .filter(groups::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(ContributionRepoError::GroupNotFound(group_id))
    }

    async fn lock_loan(
        txn: &DatabaseTransaction,
        loan_id: Uuid,
    ) -> Result<loans::Model, ContributionRepoError> {
        loans::Entity::find_by_id(loan_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(ContributionRepoError::LoanNotFound(loan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_mobile_money_savings() -> contributions::Model {
        let now = Utc::now();
        contributions::Model {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            loan_id: None,
            amount: dec!(5000),
            contribution_type: DbContributionType::Savings,
            payment_method: DbPaymentMethod::Lumicash,
            contribution_date: now.date_naive(),
            notes: None,
            status: DbContributionStatus::Pending,
            validated_by: None,
            validated_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_pending_entry_links_back_to_contribution() {
        let contribution = pending_mobile_money_savings();
        let entry =
            ContributionRepository::ledger_entry(&contribution, DbTransactionStatus::Pending);

        assert_eq!(entry.status, DbTransactionStatus::Pending);
        assert_eq!(entry.group_id, contribution.group_id);
        // Settlement recovers the contribution from the row's metadata.
        assert_eq!(
            linked_contribution_id(&entry.metadata),
            Some(contribution.id)
        );
    }
}
