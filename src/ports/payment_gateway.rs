//! Payment gateway port.
//!
//! A single synchronous charge call against an external processor. The
//! gateway is never retried automatically; callers decide what a failure
//! means for their ledger entry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Money;

/// Port for the external card processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges a card token.
    ///
    /// Returns `Ok` whenever the gateway answered with a charge, approved or
    /// not. Returns `Err` when it could not be reached, timed out, or answered
    /// with a non-success HTTP status.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, GatewayError>;
}

/// Request to charge a card token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount: Money,
    pub currency: String,
    /// Card token or saved card id.
    pub source_token: String,
    pub email: String,
    pub description: String,
}

/// Normalized gateway verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeOutcome {
    Approved,
    Rejected,
}

impl ChargeOutcome {
    /// Maps a raw `outcome.type`. Unknown values are rejections.
    pub fn from_outcome_type(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("venta_exitosa") || raw.eq_ignore_ascii_case("autorizado") {
            ChargeOutcome::Approved
        } else {
            ChargeOutcome::Rejected
        }
    }
}

/// Charge the gateway answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeResult {
    pub gateway_charge_id: String,
    pub outcome: ChargeOutcome,
    /// Raw `outcome.type`, kept for the ledger's decline reason.
    pub outcome_type: String,
}

impl ChargeResult {
    pub fn is_approved(&self) -> bool {
        self.outcome == ChargeOutcome::Approved
    }
}

/// Gateway failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Gateway's own error code, if it sent one.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn timeout(secs: u64) -> Self {
        Self::new(
            GatewayErrorCode::Timeout,
            format!("gateway did not answer within {}s", secs),
        )
    }

    /// Non-2xx answer; `message` is the raw body.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Rejected, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }

    /// True when the gateway could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self.code,
            GatewayErrorCode::NetworkError | GatewayErrorCode::Timeout
        )
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorCode {
    NetworkError,
    Timeout,
    /// Gateway answered with a non-success HTTP status.
    Rejected,
    /// 2xx body we could not read.
    InvalidResponse,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayErrorCode::NetworkError | GatewayErrorCode::Timeout)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::Rejected => "rejected",
            GatewayErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_are_case_insensitive() {
        assert_eq!(ChargeOutcome::from_outcome_type("venta_exitosa"), ChargeOutcome::Approved);
        assert_eq!(ChargeOutcome::from_outcome_type("AUTORIZADO"), ChargeOutcome::Approved);
        assert_eq!(ChargeOutcome::from_outcome_type(" Venta_Exitosa "), ChargeOutcome::Approved);
    }

    #[test]
    fn unknown_statuses_are_rejections() {
        assert_eq!(ChargeOutcome::from_outcome_type("tarjeta_rechazada"), ChargeOutcome::Rejected);
        assert_eq!(ChargeOutcome::from_outcome_type(""), ChargeOutcome::Rejected);
    }

    #[test]
    fn transport_failures_are_retryable() {
        assert!(GatewayError::network("reset").retryable);
        assert!(GatewayError::timeout(15).is_unreachable());
        assert!(!GatewayError::rejected("402").retryable);
    }

    #[test]
    fn display_includes_code() {
        let err = GatewayError::rejected("card declined").with_provider_code("card_error");
        assert_eq!(err.to_string(), "[rejected] card declined");
        assert_eq!(err.provider_code.as_deref(), Some("card_error"));
    }
}
