//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Savings-group business rules.
    #[serde(default)]
    pub rules: RulesConfig,
    /// External collaborator endpoints.
    #[serde(default)]
    pub collaborators: CollaboratorConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as loaded from config files/environment.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Business rules for contributions and loans.
///
/// Amounts are in Burundian francs (FBU).
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Minimum accepted contribution amount.
    #[serde(default = "default_min_contribution")]
    pub min_contribution: Decimal,
    /// Minimum accepted loan principal.
    #[serde(default = "default_min_loan")]
    pub min_loan: Decimal,
    /// Maximum loan term in months.
    #[serde(default = "default_max_loan_term")]
    pub max_loan_term_months: u32,
    /// Default loan interest rate (percent per year) for new groups.
    #[serde(default = "default_interest_rate")]
    pub default_interest_rate: Decimal,
    /// Default late-penalty rate (percent) for new groups.
    #[serde(default = "default_penalty_rate")]
    pub default_penalty_rate: Decimal,
}

fn default_min_contribution() -> Decimal {
    Decimal::new(100, 0)
}

fn default_min_loan() -> Decimal {
    Decimal::new(5000, 0)
}

fn default_max_loan_term() -> u32 {
    12
}

fn default_interest_rate() -> Decimal {
    Decimal::new(10, 0)
}

fn default_penalty_rate() -> Decimal {
    Decimal::new(5, 0)
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_contribution: default_min_contribution(),
            min_loan: default_min_loan(),
            max_loan_term_months: default_max_loan_term(),
            default_interest_rate: default_interest_rate(),
            default_penalty_rate: default_penalty_rate(),
        }
    }
}

/// Endpoints for external collaborators.
///
/// Both services are optional; when a base URL is absent the
/// corresponding API surface reports the collaborator as unavailable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaboratorConfig {
    /// Base URL of the analytics microservice.
    pub analytics_base_url: Option<String>,
    /// Base URL of the mobile-money gateway.
    pub payments_base_url: Option<String>,
    /// API key sent to the mobile-money gateway.
    pub payments_api_key: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TWUNGURANE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rules_defaults() {
        let rules = RulesConfig::default();
        assert_eq!(rules.min_contribution, dec!(100));
        assert_eq!(rules.min_loan, dec!(5000));
        assert_eq!(rules.max_loan_term_months, 12);
        assert_eq!(rules.default_interest_rate, dec!(10));
        assert_eq!(rules.default_penalty_rate, dec!(5));
    }
}
