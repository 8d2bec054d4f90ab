//! Group membership repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use twungurane_core::group::{MemberRole, MemberStatus};

use crate::entities::{
    group_members, groups, loans,
    sea_orm_active_enums::{DbGroupStatus, DbLoanStatus, DbMemberRole, DbMemberStatus},
    users,
};

/// Error types for membership operations.
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Group is not accepting members.
    #[error("Group is not active")]
    GroupNotActive,

    /// Group is already at capacity.
    #[error("Group is full ({0} members)")]
    GroupFull(i32),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// User is already a member of the group.
    #[error("User is already a member of this group")]
    AlreadyMember,

    /// Membership row not found.
    #[error("Membership not found: {0}")]
    NotFound(Uuid),

    /// Member still holds an outstanding loan.
    #[error("Member has an outstanding loan and cannot be removed")]
    HasOutstandingLoan,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Membership row joined with the member's user record.
#[derive(Debug, Clone)]
pub struct MemberWithUser {
    /// Membership row.
    pub membership: group_members::Model,
    /// The member's user record.
    pub user: users::Model,
}

/// Membership repository.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
}

impl MemberRepository {
    /// Creates a new membership repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds a user to a group.
    ///
    /// A previously removed member rejoins through the same row, with
    /// their savings history intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not active, is at capacity, the
    /// user is unknown, or the user is already an active member.
    pub async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<group_members::Model, MemberError> {
        let group = groups::Entity::find_by_id(group_id)
            .filter(groups::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(MemberError::GroupNotFound(group_id))?;
        if group.status != DbGroupStatus::Active {
            return Err(MemberError::GroupNotActive);
        }

        users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(MemberError::UserNotFound(user_id))?;

        let active_members = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .filter(group_members::Column::Status.eq(DbMemberStatus::Active))
            .count(&self.db)
            .await?;
        if active_members >= group.max_members as u64 {
            return Err(MemberError::GroupFull(group.max_members));
        }

        let now = Utc::now();
        let existing = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .filter(group_members::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if let Some(row) = existing {
            if row.status != DbMemberStatus::Removed {
                return Err(MemberError::AlreadyMember);
            }
            let mut active: group_members::ActiveModel = row.into();
            active.status = Set(DbMemberStatus::Active);
            active.role = Set(DbMemberRole::from(role));
            active.joined_at = Set(now.date_naive());
            active.left_at = Set(None);
            active.updated_at = Set(now.into());
            return Ok(active.update(&self.db).await?);
        }

        let membership = group_members::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(group_id),
            user_id: Set(user_id),
            role: Set(DbMemberRole::from(role)),
            status: Set(DbMemberStatus::Active),
            total_savings: Set(rust_decimal::Decimal::ZERO),
            joined_at: Set(now.date_naive()),
            left_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        Ok(membership.insert(&self.db).await?)
    }

    /// Lists a group's members with their user records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_members(&self, group_id: Uuid) -> Result<Vec<MemberWithUser>, MemberError> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .order_by_asc(group_members::Column::JoinedAt)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(membership, user)| {
                let user_id = membership.user_id;
                user.map(|user| MemberWithUser { membership, user })
                    .ok_or(MemberError::UserNotFound(user_id))
            })
            .collect()
    }

    /// Finds a membership row for a user in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<group_members::Model>, MemberError> {
        Ok(group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .filter(group_members::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// Updates a member's role or status.
    ///
    /// # Errors
    ///
    /// Returns an error if the membership row is unknown.
    pub async fn update_member(
        &self,
        membership_id: Uuid,
        role: Option<MemberRole>,
        status: Option<MemberStatus>,
    ) -> Result<group_members::Model, MemberError> {
        let row = group_members::Entity::find_by_id(membership_id)
            .one(&self.db)
            .await?
            .ok_or(MemberError::NotFound(membership_id))?;

        let mut active: group_members::ActiveModel = row.into();
        if let Some(role) = role {
            active.role = Set(role.into());
        }
        if let Some(status) = status {
            active.status = Set(status.into());
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Removes a member from a group.
    ///
    /// Refused while the member holds an outstanding loan. The row is
    /// kept with status `removed`, preserving their savings history.
    ///
    /// # Errors
    ///
    /// Returns `HasOutstandingLoan` if a pending, approved or active
    /// loan of theirs exists in the group.
    pub async fn remove_member(&self, membership_id: Uuid) -> Result<(), MemberError> {
        let row = group_members::Entity::find_by_id(membership_id)
            .one(&self.db)
            .await?
            .ok_or(MemberError::NotFound(membership_id))?;

        let outstanding = loans::Entity::find()
            .filter(loans::Column::GroupId.eq(row.group_id))
            .filter(loans::Column::UserId.eq(row.user_id))
            .filter(loans::Column::Status.is_in([
                DbLoanStatus::Pending,
                DbLoanStatus::Approved,
                DbLoanStatus::Active,
            ]))
            .count(&self.db)
            .await?;
        if outstanding > 0 {
            return Err(MemberError::HasOutstandingLoan);
        }

        let now = Utc::now();
        let mut active: group_members::ActiveModel = row.into();
        active.status = Set(DbMemberStatus::Removed);
        active.left_at = Set(Some(now.date_naive()));
        active.updated_at = Set(now.into());
        active.update(&self.db).await?;

        Ok(())
    }
}
