//! Twungurane API Server
//!
//! Main entry point for the Twungurane backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twungurane_api::{AppState, create_router};
use twungurane_core::contribution::ContributionService;
use twungurane_core::loan::LoanService;
use twungurane_db::connect;
use twungurane_shared::clients::analytics::AnalyticsClient;
use twungurane_shared::clients::payments::PaymentsClient;
use twungurane_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twungurane=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Business rules from configuration
    let contribution_rules = ContributionService::new(config.rules.min_contribution);
    let loan_rules = LoanService::new(config.rules.min_loan, config.rules.max_loan_term_months);

    // Collaborator clients; unconfigured ones answer with service errors
    let analytics = AnalyticsClient::new(config.collaborators.analytics_base_url.clone());
    let payments = PaymentsClient::new(
        config.collaborators.payments_base_url.clone(),
        config.collaborators.payments_api_key.clone(),
    );
    info!(
        analytics = analytics.is_configured(),
        payments = payments.is_configured(),
        "Collaborator clients configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        contribution_rules,
        loan_rules,
        rules: config.rules.clone(),
        analytics: Arc::new(analytics),
        payments: Arc::new(payments),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
