//! Shared types, errors, and configuration for Twungurane.
//!
//! This crate provides common types used across all other crates:
//! - Decimal amount helpers (money is never floating-point)
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service
//! - HTTP clients for the analytics and mobile-money collaborators

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
