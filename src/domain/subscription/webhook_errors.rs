//! Webhook error types for gateway notifications.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body is not a JSON object.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Subscription event names a user that does not exist (yet).
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Another delivery of the same event is being applied right now.
    #[error("Event {0} is already being processed")]
    InFlight(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the gateway should redeliver this event.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::UserNotFound(_) | WebhookError::InFlight(_)
        )
    }

    /// Maps the error to the status the gateway sees. 5xx triggers redelivery.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,
            WebhookError::InFlight(_) => StatusCode::CONFLICT,
            WebhookError::UserNotFound(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
