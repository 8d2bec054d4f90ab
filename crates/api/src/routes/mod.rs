//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

mod access;
pub mod analytics;
pub mod contributions;
pub mod groups;
pub mod health;
pub mod loans;
pub mod members;
pub mod payments;
pub mod transactions;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(groups::routes())
        .merge(members::routes())
        .merge(contributions::routes())
        .merge(loans::routes())
        .merge(transactions::routes())
        .merge(analytics::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Health and the gateway callback stay public.
    Router::new()
        .merge(health::routes())
        .merge(payments::routes())
        .merge(protected_routes)
}
