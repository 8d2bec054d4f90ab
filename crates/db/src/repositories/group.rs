//! Group repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use twungurane_core::group::{available_loan_funds, GroupStatus, GroupType};

use crate::entities::{
    group_members, groups, loans,
    sea_orm_active_enums::{DbGroupStatus, DbGroupType, DbLoanStatus, DbMemberStatus},
};

/// Error types for group operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// Group not found.
    #[error("Group not found: {0}")]
    NotFound(Uuid),

    /// Group name already in use.
    #[error("Group name '{0}' is already in use")]
    DuplicateName(String),

    /// Group cannot be deleted while loans are outstanding.
    #[error("Group has {0} outstanding loans and cannot be deleted")]
    HasOutstandingLoans(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a group.
#[derive(Debug, Clone)]
pub struct CreateGroupInput {
    /// Group name (unique among live groups).
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Kind of group.
    pub group_type: GroupType,
    /// Expected contribution per period.
    pub contribution_amount: Decimal,
    /// Contribution frequency.
    pub frequency: twungurane_core::group::Frequency,
    /// Annual loan interest rate in percent.
    pub interest_rate: Decimal,
    /// Penalty rate in percent.
    pub penalty_rate: Decimal,
    /// Cycle duration in months.
    pub duration_months: i32,
    /// Maximum number of members.
    pub max_members: i32,
    /// Creating user.
    pub created_by: Uuid,
}

/// Input for updating a group; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateGroupInput {
    /// Group name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<Option<String>>,
    /// Lifecycle status.
    pub status: Option<GroupStatus>,
    /// Expected contribution per period.
    pub contribution_amount: Option<Decimal>,
    /// Annual loan interest rate.
    pub interest_rate: Option<Decimal>,
    /// Penalty rate.
    pub penalty_rate: Option<Decimal>,
    /// Maximum number of members.
    pub max_members: Option<i32>,
}

/// Filter options for listing groups.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    /// Filter by status.
    pub status: Option<GroupStatus>,
    /// Filter by kind.
    pub group_type: Option<GroupType>,
    /// Restrict to groups where this user is an active member.
    pub member_user_id: Option<Uuid>,
}

/// Financial summary of a group.
#[derive(Debug, Clone)]
pub struct GroupBalanceSummary {
    /// Current balance of the pot.
    pub balance: Decimal,
    /// Sum of validated savings across members.
    pub total_savings: Decimal,
    /// Principal of approved/active loans not yet repaid out.
    pub outstanding_loan_principal: Decimal,
    /// Principal reserved by pending loan requests.
    pub reserved_for_requests: Decimal,
    /// Funds the group can still lend.
    pub available_loan_funds: Decimal,
    /// Active member count.
    pub member_count: u64,
}

/// Group repository for CRUD and balance reporting.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a group and enrolls the creator as its admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the insert fails.
    pub async fn create_group(&self, input: CreateGroupInput) -> Result<groups::Model, GroupError> {
        let existing = groups::Entity::find()
            .filter(groups::Column::Name.eq(&input.name))
            .filter(groups::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(GroupError::DuplicateName(input.name));
        }

        let now = Utc::now();
        let group = groups::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            group_type: Set(DbGroupType::from(input.group_type)),
            status: Set(DbGroupStatus::Active),
            contribution_amount: Set(input.contribution_amount),
            frequency: Set(input.frequency.into()),
            interest_rate: Set(input.interest_rate),
            penalty_rate: Set(input.penalty_rate),
            duration_months: Set(input.duration_months),
            max_members: Set(input.max_members),
            balance: Set(Decimal::ZERO),
            created_by: Set(input.created_by),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let group = group.insert(&self.db).await?;

        // The creator starts as group admin.
        let membership = group_members::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(group.id),
            user_id: Set(group.created_by),
            role: Set(crate::entities::sea_orm_active_enums::DbMemberRole::Admin),
            status: Set(DbMemberStatus::Active),
            total_savings: Set(Decimal::ZERO),
            joined_at: Set(now.date_naive()),
            left_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        membership.insert(&self.db).await?;

        Ok(group)
    }

    /// Lists live groups, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_groups(
        &self,
        filter: GroupFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<groups::Model>, u64), GroupError> {
        let mut query = groups::Entity::find().filter(groups::Column::DeletedAt.is_null());

        if let Some(status) = filter.status {
            query = query.filter(groups::Column::Status.eq(DbGroupStatus::from(status)));
        }
        if let Some(group_type) = filter.group_type {
            query = query.filter(groups::Column::GroupType.eq(DbGroupType::from(group_type)));
        }
        if let Some(user_id) = filter.member_user_id {
            let member_group_ids: Vec<Uuid> = group_members::Entity::find()
                .filter(group_members::Column::UserId.eq(user_id))
                .filter(group_members::Column::Status.eq(DbMemberStatus::Active))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|m| m.group_id)
                .collect();
            query = query.filter(groups::Column::Id.is_in(member_group_ids));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(groups::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Finds a live group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<groups::Model>, GroupError> {
        Ok(groups::Entity::find_by_id(id)
            .filter(groups::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?)
    }

    /// Updates group settings.
    ///
    /// Rate changes only affect loans requested afterwards; existing
    /// loans keep the rate captured at request time.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or the name is taken.
    pub async fn update_group(
        &self,
        id: Uuid,
        input: UpdateGroupInput,
    ) -> Result<groups::Model, GroupError> {
        let group = self
            .find_by_id(id)
            .await?
            .ok_or(GroupError::NotFound(id))?;

        if let Some(new_name) = &input.name
            && *new_name != group.name
        {
            let existing = groups::Entity::find()
                .filter(groups::Column::Name.eq(new_name))
                .filter(groups::Column::DeletedAt.is_null())
                .filter(groups::Column::Id.ne(id))
                .one(&self.db)
                .await?;
            if existing.is_some() {
                return Err(GroupError::DuplicateName(new_name.clone()));
            }
        }

        let mut active: groups::ActiveModel = group.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(status) = input.status {
            active.status = Set(status.into());
        }
        if let Some(amount) = input.contribution_amount {
            active.contribution_amount = Set(amount);
        }
        if let Some(rate) = input.interest_rate {
            active.interest_rate = Set(rate);
        }
        if let Some(rate) = input.penalty_rate {
            active.penalty_rate = Set(rate);
        }
        if let Some(max) = input.max_members {
            active.max_members = Set(max);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes a group.
    ///
    /// Refused while any loan of the group is still outstanding; the
    /// history stays queryable.
    ///
    /// # Errors
    ///
    /// Returns `HasOutstandingLoans` when loans are pending, approved
    /// or active.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), GroupError> {
        let group = self
            .find_by_id(id)
            .await?
            .ok_or(GroupError::NotFound(id))?;

        let outstanding = loans::Entity::find()
            .filter(loans::Column::GroupId.eq(id))
            .filter(loans::Column::Status.is_in([
                DbLoanStatus::Pending,
                DbLoanStatus::Approved,
                DbLoanStatus::Active,
            ]))
            .count(&self.db)
            .await?;
        if outstanding > 0 {
            return Err(GroupError::HasOutstandingLoans(outstanding));
        }

        let now = Utc::now().into();
        let mut active: groups::ActiveModel = group.into();
        active.deleted_at = Set(Some(now));
        active.status = Set(DbGroupStatus::Terminated);
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        Ok(())
    }

    /// Computes a group's financial summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or a query fails.
    pub async fn balance_summary(&self, id: Uuid) -> Result<GroupBalanceSummary, GroupError> {
        let group = self
            .find_by_id(id)
            .await?
            .ok_or(GroupError::NotFound(id))?;

        let members = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(id))
            .filter(group_members::Column::Status.eq(DbMemberStatus::Active))
            .all(&self.db)
            .await?;
        let member_count = members.len() as u64;
        let total_savings: Decimal = members.iter().map(|m| m.total_savings).sum();

        let loan_rows = loans::Entity::find()
            .filter(loans::Column::GroupId.eq(id))
            .filter(loans::Column::Status.is_in([
                DbLoanStatus::Pending,
                DbLoanStatus::Approved,
                DbLoanStatus::Active,
            ]))
            .all(&self.db)
            .await?;

        let mut outstanding_loan_principal = Decimal::ZERO;
        let mut reserved_for_requests = Decimal::ZERO;
        for loan in &loan_rows {
            if loan.status == DbLoanStatus::Pending {
                reserved_for_requests += loan.principal;
            } else {
                outstanding_loan_principal += loan.principal;
            }
        }

        Ok(GroupBalanceSummary {
            balance: group.balance,
            total_savings,
            outstanding_loan_principal,
            reserved_for_requests,
            available_loan_funds: available_loan_funds(group.balance, reserved_for_requests),
            member_count,
        })
    }
}
