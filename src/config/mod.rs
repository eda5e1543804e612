//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `CONTACT_GATE` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use contact_gate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod gateway;
mod pricing;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use pricing::PricingConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::application::ChargeSettings;

/// Root application configuration.
///
/// Every section has defaults, so an empty environment yields a local
/// setup: in-memory store and approving mock gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub pricing: PricingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `CONTACT_GATE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CONTACT_GATE__GATEWAY__API_KEY=...` -> `gateway.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONTACT_GATE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate(production)?;
        self.gateway.validate(production)?;
        self.pricing.validate()?;
        if self.server.request_timeout_secs <= self.gateway.timeout_secs {
            return Err(ValidationError::RequestTimeoutBelowGateway);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Charge parameters shared by the unlock and charge handlers.
    pub fn charge_settings(&self) -> Result<ChargeSettings, ValidationError> {
        Ok(ChargeSettings {
            currency: self.gateway.currency.clone(),
            gateway_timeout: self.gateway.timeout(),
            default_access_price: self.pricing.default_access_price()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CONTACT_GATE__SERVER__PORT",
        "CONTACT_GATE__SERVER__ENVIRONMENT",
        "CONTACT_GATE__DATABASE__URL",
        "CONTACT_GATE__GATEWAY__API_KEY",
        "CONTACT_GATE__GATEWAY__TIMEOUT_SECS",
        "CONTACT_GATE__PRICING__DEFAULT_ACCESS_PRICE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_is_valid_local_setup() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert!(config.validate().is_ok());
        assert!(!config.database.is_configured());
        assert!(!config.gateway.is_configured());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_request_timeout_must_outlast_gateway_call() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let mut config = AppConfig::load().unwrap();

        config.server.request_timeout_secs = config.gateway.timeout_secs;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::RequestTimeoutBelowGateway)
        ));

        config.server.request_timeout_secs = config.gateway.timeout_secs + 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_values_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CONTACT_GATE__SERVER__PORT", "3000");
        env::set_var("CONTACT_GATE__DATABASE__URL", "postgresql://test@localhost/gate");
        env::set_var("CONTACT_GATE__GATEWAY__API_KEY", "sk_test_xxx");
        env::set_var("CONTACT_GATE__GATEWAY__TIMEOUT_SECS", "5");
        env::set_var("CONTACT_GATE__PRICING__DEFAULT_ACCESS_PRICE", "12.5");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "postgresql://test@localhost/gate");
        assert!(config.gateway.is_test_mode());

        let settings = config.charge_settings().unwrap();
        assert_eq!(settings.gateway_timeout, Duration::from_secs(5));
        assert_eq!(settings.default_access_price.minor_units(), 1250);
    }

    #[test]
    fn test_production_requires_database_and_gateway() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CONTACT_GATE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }
}
