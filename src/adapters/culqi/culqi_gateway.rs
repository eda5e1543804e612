//! Culqi payment gateway adapter.
//!
//! Implements `PaymentGateway` over the Culqi REST API: one bearer-authenticated
//! `POST {api_url}/charges` per charge, no retries.
//!
//! # Configuration
//!
//! ```ignore
//! let config = CulqiConfig::new(api_key).with_base_url("https://api.culqi.com/v2");
//! let gateway = CulqiGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{ChargeOutcome, ChargeRequest, ChargeResult, GatewayError, PaymentGateway};

use super::charge_types::{CulqiCharge, CulqiChargePayload, CulqiErrorBody};

const DEFAULT_API_URL: &str = "https://api.culqi.com/v2";

/// Culqi API configuration.
#[derive(Clone)]
pub struct CulqiConfig {
    /// Secret key (sk_test_... or sk_live_...).
    api_key: SecretString,

    api_base_url: String,

    /// Transport timeout; the application layer applies its own bound too.
    timeout: Duration,
}

impl CulqiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn charges_url(&self) -> String {
        format!("{}/charges", self.api_base_url)
    }
}

/// Culqi gateway adapter.
pub struct CulqiGateway {
    config: CulqiConfig,
    http_client: reqwest::Client,
}

impl CulqiGateway {
    pub fn new(config: CulqiConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn rejection_from_body(status: reqwest::StatusCode, body: &str) -> GatewayError {
        let parsed: CulqiErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .merchant_message
            .clone()
            .or_else(|| parsed.user_message.clone())
            .unwrap_or_else(|| body.to_string());
        let err = GatewayError::rejected(format!("HTTP {}: {}", status.as_u16(), message));
        match parsed.provider_code() {
            Some(code) => err.with_provider_code(code),
            None => err,
        }
    }
}

#[async_trait]
impl PaymentGateway for CulqiGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, GatewayError> {
        let payload = CulqiChargePayload {
            amount: request.amount.minor_units(),
            currency_code: &request.currency,
            source_id: &request.source_token,
            email: &request.email,
            description: &request.description,
        };

        let response = self
            .http_client
            .post(self.config.charges_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::timeout(self.config.timeout.as_secs())
                } else {
                    GatewayError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Self::rejection_from_body(status, &body);
            tracing::warn!(
                status = status.as_u16(),
                provider_code = ?err.provider_code,
                "Culqi charge rejected"
            );
            return Err(err);
        }

        let charge: CulqiCharge = response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(format!("Failed to parse Culqi response: {}", e)))?;

        let outcome_type = charge.outcome_type().to_string();
        let outcome = ChargeOutcome::from_outcome_type(&outcome_type);
        tracing::info!(
            charge_id = %charge.id,
            outcome_type = %outcome_type,
            approved = outcome == ChargeOutcome::Approved,
            "Culqi charge answered"
        );

        Ok(ChargeResult {
            gateway_charge_id: charge.id,
            outcome,
            outcome_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::GatewayErrorCode;

    #[test]
    fn config_defaults_to_public_api() {
        let config = CulqiConfig::new("sk_test_123");
        assert_eq!(config.charges_url(), "https://api.culqi.com/v2/charges");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let config = CulqiConfig::new("sk_test_123").with_base_url("http://localhost:9000/v2/");
        assert_eq!(config.charges_url(), "http://localhost:9000/v2/charges");
    }

    #[test]
    fn error_body_becomes_rejection_with_provider_code() {
        let body = r#"{"object":"error","type":"card_error","code":"card_declined","merchant_message":"Fondos insuficientes"}"#;
        let err = CulqiGateway::rejection_from_body(reqwest::StatusCode::PAYMENT_REQUIRED, body);
        assert_eq!(err.code, GatewayErrorCode::Rejected);
        assert_eq!(err.provider_code.as_deref(), Some("card_declined"));
        assert!(err.message.contains("402"));
        assert!(!err.retryable);
    }

    #[test]
    fn non_json_error_body_is_kept_raw() {
        let err = CulqiGateway::rejection_from_body(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.message.contains("upstream down"));
        assert!(err.provider_code.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let gateway = CulqiGateway::new(
            CulqiConfig::new("sk_test_123")
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = gateway
            .charge(ChargeRequest {
                amount: crate::domain::foundation::Money::from_minor(100).unwrap(),
                currency: "PEN".to_string(),
                source_token: "tkn_test".to_string(),
                email: "a@b.c".to_string(),
                description: "test".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
    }
}
