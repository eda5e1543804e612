//! Payment gateway configuration (Culqi)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Culqi charge API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Culqi secret key (`sk_test_...` / `sk_live_...`). Empty outside
    /// production selects the approving mock gateway.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// ISO 4217 code sent with every charge
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Bound on a single charge call
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Culqi plan backing the monthly subscription
    pub monthly_plan_id: Option<String>,
}

impl GatewayConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.is_configured() {
            if production {
                return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
            }
        } else if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if production && !self.api_url.starts_with("https://") {
            return Err(ValidationError::GatewayUrlMustBeHttps);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            currency: default_currency(),
            timeout_secs: default_timeout(),
            monthly_plan_id: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.culqi.com/v2".to_string()
}

fn default_currency() -> String {
    "PEN".to_string()
}

fn default_timeout() -> u64 {
    15
}
