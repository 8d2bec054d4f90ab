//! `SeaORM` Entity for the append-only transactions ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DbTransactionSource, DbTransactionStatus, DbTransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable unique reference, e.g. `PRT-20260825-1A2B3C`.
    #[sea_orm(unique)]
    pub reference: String,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub transaction_type: DbTransactionType,
    pub source: DbTransactionSource,
    pub status: DbTransactionStatus,
    pub description: String,
    /// Date the money moved, as opposed to when the row was written.
    pub transaction_date: Date,
    /// Linked contribution/loan ids and external payment references.
    pub metadata: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id"
    )]
    Groups,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
