//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - Response types

pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use twungurane_core::contribution::ContributionService;
use twungurane_core::loan::LoanService;
use twungurane_shared::clients::analytics::AnalyticsClient;
use twungurane_shared::clients::payments::PaymentsClient;
use twungurane_shared::config::RulesConfig;
use twungurane_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Contribution rules built from configuration.
    pub contribution_rules: ContributionService,
    /// Loan rules built from configuration.
    pub loan_rules: LoanService,
    /// Raw rules configuration, for per-group defaults.
    pub rules: RulesConfig,
    /// Analytics collaborator client.
    pub analytics: Arc<AnalyticsClient>,
    /// Mobile-money gateway client.
    pub payments: Arc<PaymentsClient>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
