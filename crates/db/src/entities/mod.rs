//! `SeaORM` entity definitions.

pub mod contributions;
pub mod group_members;
pub mod groups;
pub mod loans;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
