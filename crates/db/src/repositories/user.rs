//! User repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use twungurane_shared::clients::payments::{is_valid_phone, normalize_phone};

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Phone number already registered.
    #[error("Phone number '{0}' is already registered")]
    DuplicatePhone(String),

    /// Phone number is not a valid Burundian number.
    #[error("Phone number '{0}' is not a valid Burundian number")]
    InvalidPhone(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Full name.
    pub full_name: String,
    /// Phone number; normalized to `+257` form before storage.
    pub phone: String,
    /// Optional email.
    pub email: Option<String>,
    /// Platform role.
    pub role: UserRole,
}

/// User repository for registration and lookup.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the phone number is malformed or already
    /// registered.
    pub async fn create_user(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        if !is_valid_phone(&input.phone) {
            return Err(UserError::InvalidPhone(input.phone));
        }
        let phone = normalize_phone(&input.phone);

        let existing = users::Entity::find()
            .filter(users::Column::Phone.eq(&phone))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(UserError::DuplicatePhone(phone));
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(input.full_name),
            phone: Set(phone),
            email: Set(input.email),
            role: Set(input.role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(user.insert(&self.db).await?)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Finds a user by phone number; the input is normalized first.
    ///
    /// # Errors
    ///
    /// Returns an error if the phone is malformed or the query fails.
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<users::Model>, UserError> {
        if !is_valid_phone(phone) {
            return Err(UserError::InvalidPhone(phone.to_string()));
        }
        let phone = normalize_phone(phone);
        Ok(users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(&self.db)
            .await?)
    }

    /// Lists users, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_users(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<users::Model>, u64), UserError> {
        let total = users::Entity::find().count(&self.db).await?;
        let users = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((users, total))
    }
}
