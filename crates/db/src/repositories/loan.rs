//! Loan repository.
//!
//! Requesting, approving, rejecting and repaying loans. Every mutation
//! runs in one database transaction with the group row and (where one
//! exists) the loan row locked `FOR UPDATE`, group first then loan,
//! the same order the contribution repository uses; the funds checks
//! are re-run inside that transaction so concurrent requests cannot
//! over-commit the pot.

use chrono::{Months, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use twungurane_core::contribution::{ContributionType, PaymentMethod};
use twungurane_core::group::{self, available_loan_funds, BalanceEvent};
use twungurane_core::ledger::{TransactionKind, TransactionSource};
use twungurane_core::loan::{Amortization, LoanError, LoanRequest, LoanService, LoanStatus};

use crate::entities::{
    contributions, group_members, groups, loans,
    sea_orm_active_enums::{
        DbContributionStatus, DbContributionType, DbGroupStatus, DbLoanStatus, DbMemberStatus,
        DbPaymentMethod, DbTransactionStatus,
    },
};
use crate::repositories::ledger::{LedgerRepository, NewLedgerEntry};

/// Error types for loan operations.
#[derive(Debug, thiserror::Error)]
pub enum LoanRepoError {
    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Group is not accepting money movements.
    #[error("Group is not active")]
    GroupNotActive,

    /// Loan not found.
    #[error("Loan not found: {0}")]
    NotFound(Uuid),

    /// A loan rule was violated.
    #[error(transparent)]
    Rule(#[from] LoanError),

    /// The balance invariant would be violated.
    #[error(transparent)]
    Balance(#[from] group::BalanceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for requesting a loan.
#[derive(Debug, Clone)]
pub struct RequestLoanInput {
    /// Group to borrow from.
    pub group_id: Uuid,
    /// Borrowing member.
    pub user_id: Uuid,
    /// Principal asked for.
    pub principal: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// What the loan is for.
    pub purpose: String,
    /// Optional guarantee text.
    pub guarantee: Option<String>,
}

/// Filter options for listing loans.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    /// Filter by borrower.
    pub user_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<LoanStatus>,
}

/// Aggregate loan statistics for a group.
#[derive(Debug, Clone)]
pub struct GroupLoanStats {
    /// Principal ever disbursed (approved, active or repaid loans).
    pub total_granted: Decimal,
    /// Principal of approved/active loans.
    pub outstanding_principal: Decimal,
    /// Sum of `amount_repaid` across all loans.
    pub total_repaid: Decimal,
    /// Number of loans awaiting a decision.
    pub pending_count: u64,
    /// Number of approved/active loans.
    pub active_count: u64,
    /// Number of fully repaid loans.
    pub repaid_count: u64,
}

/// A loan with its computed repayment schedule.
#[derive(Debug, Clone)]
pub struct LoanWithSchedule {
    /// The loan record.
    pub loan: loans::Model,
    /// Recomputed amortization; `None` when the stored fields cannot
    /// reproduce a valid schedule.
    pub amortization: Option<Amortization>,
}

/// Loan repository.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
    rules: LoanService,
}

impl LoanRepository {
    /// Creates a new loan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, rules: LoanService) -> Self {
        Self { db, rules }
    }

    /// Requests a loan.
    ///
    /// The interest rate is captured from the group at request time;
    /// rate changes later never touch this loan. Other pending
    /// requests' principal is treated as reserved when checking funds.
    ///
    /// # Errors
    ///
    /// Returns an error for inactive groups or borrowers, an existing
    /// outstanding loan, or insufficient funds.
    pub async fn request(&self, input: RequestLoanInput) -> Result<loans::Model, LoanRepoError> {
        let txn = self.db.begin().await?;

        let group = Self::lock_group(&txn, input.group_id).await?;
        if group.status != DbGroupStatus::Active {
            return Err(LoanRepoError::GroupNotActive);
        }

        let membership = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(input.group_id))
            .filter(group_members::Column::UserId.eq(input.user_id))
            .one(&txn)
            .await?;
        let borrower_is_active = membership.is_some_and(|m| m.status == DbMemberStatus::Active);

        let outstanding = loans::Entity::find()
            .filter(loans::Column::GroupId.eq(input.group_id))
            .filter(loans::Column::UserId.eq(input.user_id))
            .filter(loans::Column::Status.is_in([
                DbLoanStatus::Pending,
                DbLoanStatus::Approved,
                DbLoanStatus::Active,
            ]))
            .count(&txn)
            .await?;

        let reserved = Self::pending_principal(&txn, input.group_id, None).await?;
        let available = available_loan_funds(group.balance, reserved);

        let now = Utc::now();
        let amortization = self.rules.validate_request(
            &LoanRequest {
                principal: input.principal,
                term_months: input.term_months,
                annual_rate: group.interest_rate,
            },
            borrower_is_active,
            outstanding > 0,
            available,
            now.date_naive(),
        )?;

        let loan = loans::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(input.group_id),
            user_id: Set(input.user_id),
            principal: Set(amortization.principal),
            interest_rate: Set(amortization.annual_rate),
            term_months: Set(i32::try_from(amortization.term_months).unwrap_or(i32::MAX)),
            interest: Set(amortization.interest),
            total_payable: Set(amortization.total_payable),
            monthly_installment: Set(amortization.monthly_installment),
            amount_repaid: Set(Decimal::ZERO),
            repayment_count: Set(0),
            purpose: Set(input.purpose),
            guarantee: Set(input.guarantee),
            status: Set(DbLoanStatus::Pending),
            requested_at: Set(now.into()),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_by: Set(None),
            rejected_at: Set(None),
            rejection_reason: Set(None),
            due_date: Set(None),
            completed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let loan = loan.insert(&txn).await?;

        txn.commit().await?;
        Ok(loan)
    }

    /// Approves a pending loan and disburses the principal.
    ///
    /// The funds check is re-run here inside the same transaction that
    /// debits the balance; the due date anchors on the approval date.
    ///
    /// # Errors
    ///
    /// Returns an error unless the loan is pending and the group can
    /// still cover the principal.
    pub async fn approve(
        &self,
        loan_id: Uuid,
        approved_by: Uuid,
    ) -> Result<loans::Model, LoanRepoError> {
        let txn = self.db.begin().await?;

        let (group, loan) = Self::lock_group_then_loan(&txn, loan_id).await?;
        if group.status != DbGroupStatus::Active {
            return Err(LoanRepoError::GroupNotActive);
        }

        let reserved = Self::pending_principal(&txn, loan.group_id, Some(loan.id)).await?;
        let available = available_loan_funds(group.balance, reserved);
        self.rules
            .validate_approval(loan.status.into(), loan.principal, available)?;

        let new_balance =
            group::apply_event(group.balance, BalanceEvent::Debit(loan.principal))?;

        let now = Utc::now();
        let due_date = now
            .date_naive()
            .checked_add_months(Months::new(u32::try_from(loan.term_months).unwrap_or(0)));

        let mut group_active: groups::ActiveModel = group.into();
        group_active.balance = Set(new_balance);
        group_active.updated_at = Set(now.into());
        group_active.update(&txn).await?;

        let principal = loan.principal;
        let borrower = loan.user_id;
        let group_id = loan.group_id;
        let mut active: loans::ActiveModel = loan.into();
        active.status = Set(DbLoanStatus::Approved);
        active.approved_by = Set(Some(approved_by));
        active.approved_at = Set(Some(now.into()));
        active.due_date = Set(due_date);
        active.updated_at = Set(now.into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append_in_txn(
            &txn,
            NewLedgerEntry {
                group_id,
                user_id: borrower,
                amount: principal,
                kind: TransactionKind::LoanDisbursement,
                source: TransactionSource::Internal,
                status: DbTransactionStatus::Completed,
                description: format!("Loan disbursement of {principal} FBU"),
                metadata: json!({ "loan_id": updated.id }),
                date: now.date_naive(),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Rejects a pending loan. No balance effect.
    ///
    /// # Errors
    ///
    /// Returns an error unless the loan is pending and a reason is
    /// given.
    pub async fn reject(
        &self,
        loan_id: Uuid,
        rejected_by: Uuid,
        reason: &str,
    ) -> Result<loans::Model, LoanRepoError> {
        let txn = self.db.begin().await?;

        let loan = Self::lock_loan(&txn, loan_id).await?;
        self.rules.validate_rejection(loan.status.into(), reason)?;

        let now = Utc::now().into();
        let mut active: loans::ActiveModel = loan.into();
        active.status = Set(DbLoanStatus::Rejected);
        active.rejected_by = Set(Some(rejected_by));
        active.rejected_at = Set(Some(now));
        active.rejection_reason = Set(Some(reason.to_string()));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Applies a repayment to a loan.
    ///
    /// The amount is clamped to what is still outstanding. A validated
    /// repayment contribution is recorded, the loan and group balance
    /// updated, and a ledger entry appended, all atomically. The loan
    /// moves to `repaid` exactly when the total is settled.
    ///
    /// # Errors
    ///
    /// Returns an error for loans outside `approved`/`active` or
    /// non-positive amounts.
    pub async fn repay(
        &self,
        loan_id: Uuid,
        amount: Decimal,
        payment_method: PaymentMethod,
        recorded_by: Uuid,
    ) -> Result<loans::Model, LoanRepoError> {
        let txn = self.db.begin().await?;

        let (group, loan) = Self::lock_group_then_loan(&txn, loan_id).await?;

        let outcome = self.rules.apply_repayment(
            loan.status.into(),
            loan.total_payable,
            loan.amount_repaid,
            amount,
        )?;

        let new_balance =
            group::apply_event(group.balance, BalanceEvent::Credit(outcome.applied))?;

        let now = Utc::now();
        let mut group_active: groups::ActiveModel = group.into();
        group_active.balance = Set(new_balance);
        group_active.updated_at = Set(now.into());
        group_active.update(&txn).await?;

        let contribution = contributions::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(loan.group_id),
            user_id: Set(loan.user_id),
            loan_id: Set(Some(loan.id)),
            amount: Set(outcome.applied),
            contribution_type: Set(DbContributionType::Repayment),
            payment_method: Set(DbPaymentMethod::from(payment_method)),
            contribution_date: Set(now.date_naive()),
            notes: Set(None),
            status: Set(DbContributionStatus::Validated),
            validated_by: Set(Some(recorded_by)),
            validated_at: Set(Some(now.into())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let contribution = contribution.insert(&txn).await?;

        let group_id = loan.group_id;
        let borrower = loan.user_id;
        let repayment_count = loan.repayment_count;
        let mut active: loans::ActiveModel = loan.into();
        active.amount_repaid = Set(outcome.amount_repaid);
        active.repayment_count = Set(repayment_count + 1);
        active.status = Set(DbLoanStatus::from(outcome.next_status));
        if outcome.next_status == LoanStatus::Repaid {
            active.completed_at = Set(Some(now.into()));
        }
        active.updated_at = Set(now.into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append_in_txn(
            &txn,
            NewLedgerEntry {
                group_id,
                user_id: borrower,
                amount: outcome.applied,
                kind: TransactionKind::LoanRepayment,
                source: TransactionSource::from(payment_method),
                status: DbTransactionStatus::Completed,
                description: format!("Loan repayment of {} FBU", outcome.applied),
                metadata: json!({
                    "loan_id": updated.id,
                    "contribution_id": contribution.id,
                }),
                date: now.date_naive(),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Lists a group's loans, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_group(
        &self,
        group_id: Uuid,
        filter: LoanFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<loans::Model>, u64), LoanRepoError> {
        let mut query = loans::Entity::find().filter(loans::Column::GroupId.eq(group_id));

        if let Some(user_id) = filter.user_id {
            query = query.filter(loans::Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(loans::Column::Status.eq(DbLoanStatus::from(status)));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(loans::Column::RequestedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Finds a loan with its recomputed repayment schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_schedule(
        &self,
        loan_id: Uuid,
    ) -> Result<Option<LoanWithSchedule>, LoanRepoError> {
        let Some(loan) = loans::Entity::find_by_id(loan_id).one(&self.db).await? else {
            return Ok(None);
        };

        // The schedule anchors on approval where one happened, else on
        // the request date.
        let anchor = loan
            .approved_at
            .map_or(loan.requested_at.date_naive(), |at| at.date_naive());
        let amortization = u32::try_from(loan.term_months).ok().and_then(|term| {
            Amortization::compute(loan.principal, loan.interest_rate, term, term, anchor).ok()
        });

        Ok(Some(LoanWithSchedule { loan, amortization }))
    }

    /// Computes aggregate loan statistics for a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn group_stats(&self, group_id: Uuid) -> Result<GroupLoanStats, LoanRepoError> {
        let rows = loans::Entity::find()
            .filter(loans::Column::GroupId.eq(group_id))
            .all(&self.db)
            .await?;

        let mut stats = GroupLoanStats {
            total_granted: Decimal::ZERO,
            outstanding_principal: Decimal::ZERO,
            total_repaid: Decimal::ZERO,
            pending_count: 0,
            active_count: 0,
            repaid_count: 0,
        };

        for loan in &rows {
            stats.total_repaid += loan.amount_repaid;
            match loan.status {
                DbLoanStatus::Pending => stats.pending_count += 1,
                DbLoanStatus::Approved | DbLoanStatus::Active => {
                    stats.total_granted += loan.principal;
                    stats.outstanding_principal += loan.principal;
                    stats.active_count += 1;
                }
                DbLoanStatus::Repaid => {
                    stats.total_granted += loan.principal;
                    stats.repaid_count += 1;
                }
                DbLoanStatus::Rejected => {}
            }
        }

        Ok(stats)
    }

    /// Sums the principal of pending loan requests in a group,
    /// optionally excluding one loan (the one under consideration).
    async fn pending_principal(
        txn: &DatabaseTransaction,
        group_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Decimal, LoanRepoError> {
        let mut query = loans::Entity::find()
            .filter(loans::Column::GroupId.eq(group_id))
            .filter(loans::Column::Status.eq(DbLoanStatus::Pending));
        if let Some(id) = exclude {
            query = query.filter(loans::Column::Id.ne(id));
        }
        let rows = query.all(txn).await?;
        Ok(rows.iter().map(|loan| loan.principal).sum())
    }

    async fn lock_group(
        txn: &DatabaseTransaction,
        group_id: Uuid,
    ) -> Result<groups::Model, LoanRepoError> {
        groups::Entity::find_by_id(group_id)
            .filter(groups::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LoanRepoError::GroupNotFound(group_id))
    }

    async fn lock_loan(
        txn: &DatabaseTransaction,
        loan_id: Uuid,
    ) -> Result<loans::Model, LoanRepoError> {
        loans::Entity::find_by_id(loan_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LoanRepoError::NotFound(loan_id))
    }

    /// Locks a loan's group row and then the loan row, in that order.
    ///
    /// Every money-moving transaction takes the group lock before the
    /// loan lock, so concurrent movements in one group serialize
    /// instead of deadlocking. The unlocked pre-read only supplies the
    /// group id, which never changes; the locked reads are
    /// authoritative.
    async fn lock_group_then_loan(
        txn: &DatabaseTransaction,
        loan_id: Uuid,
    ) -> Result<(groups::Model, loans::Model), LoanRepoError> {
        let group_id = loans::Entity::find_by_id(loan_id)
            .one(txn)
            .await?
            .ok_or(LoanRepoError::NotFound(loan_id))?
            .group_id;
        let group = Self::lock_group(txn, group_id).await?;
        let loan = Self::lock_loan(txn, loan_id).await?;
        Ok((group, loan))
    }
}
