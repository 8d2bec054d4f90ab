//! Core savings-group accounting logic for Twungurane.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `group` - Group/member types and the balance accumulator
//! - `contribution` - Contribution validation and balance effects
//! - `loan` - Amortization and the loan lifecycle state machine
//! - `ledger` - Append-only transaction kinds and references

pub mod contribution;
pub mod group;
pub mod ledger;
pub mod loan;
