//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Every money-moving repository method runs inside a single database
//! transaction with the affected group row (and loan row, where
//! relevant) locked `FOR UPDATE`, so the group balance, member totals,
//! loan repayment state and the ledger stay mutually consistent.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    ContributionRepository, GroupRepository, LedgerRepository, LoanRepository, MemberRepository,
    UserRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
