//! Errors surfaced by the unlock and charge flows.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | AgentNotFound / UserNotFound | 404 |
//! | ProductUnavailable | 422 |
//! | InvalidInput | 400 |
//! | AlreadyGranted | 409 |
//! | PaymentDeclined | 402 |
//! | GatewayUnreachable | 503 |
//! | PersistenceConflict | 409 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{AgentId, DomainError, ErrorCode, LedgerEntryId, UserId, ValidationError};

/// Errors of the payment transaction engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionError {
    /// Agent is absent or not eligible for gating.
    AgentNotFound(AgentId),

    UserNotFound(UserId),

    /// Product is missing from the catalog or not available for sale.
    ProductUnavailable {
        product: String,
        reason: String,
    },

    /// Request failed validation; nothing was written.
    InvalidInput {
        field: String,
        message: String,
    },

    /// The pair already holds a grant; nothing was charged.
    AlreadyGranted {
        user_id: UserId,
        agent_id: AgentId,
    },

    /// Gateway answered with a rejection; a REJECTED entry was recorded.
    PaymentDeclined {
        ledger_id: LedgerEntryId,
        reason: String,
    },

    /// Gateway could not be reached or timed out.
    GatewayUnreachable {
        ledger_id: LedgerEntryId,
        reason: String,
    },

    /// Lost a race against a concurrent writer.
    PersistenceConflict(String),

    Infrastructure(String),
}

impl TransactionError {
    pub fn agent_not_found(agent_id: AgentId) -> Self {
        TransactionError::AgentNotFound(agent_id)
    }

    pub fn user_not_found(user_id: UserId) -> Self {
        TransactionError::UserNotFound(user_id)
    }

    pub fn product_unavailable(product: impl Into<String>, reason: impl Into<String>) -> Self {
        TransactionError::ProductUnavailable {
            product: product.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        TransactionError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn already_granted(user_id: UserId, agent_id: AgentId) -> Self {
        TransactionError::AlreadyGranted { user_id, agent_id }
    }

    pub fn payment_declined(ledger_id: LedgerEntryId, reason: impl Into<String>) -> Self {
        TransactionError::PaymentDeclined {
            ledger_id,
            reason: reason.into(),
        }
    }

    pub fn gateway_unreachable(ledger_id: LedgerEntryId, reason: impl Into<String>) -> Self {
        TransactionError::GatewayUnreachable {
            ledger_id,
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        TransactionError::PersistenceConflict(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        TransactionError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TransactionError::AgentNotFound(_) => ErrorCode::AgentNotFound,
            TransactionError::UserNotFound(_) => ErrorCode::UserNotFound,
            TransactionError::ProductUnavailable { .. } => ErrorCode::ProductUnavailable,
            TransactionError::InvalidInput { .. } => ErrorCode::ValidationFailed,
            TransactionError::AlreadyGranted { .. } => ErrorCode::AlreadyGranted,
            TransactionError::PaymentDeclined { .. } => ErrorCode::PaymentDeclined,
            TransactionError::GatewayUnreachable { .. } => ErrorCode::GatewayUnreachable,
            TransactionError::PersistenceConflict(_) => ErrorCode::PersistenceConflict,
            TransactionError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a user-facing message without gateway internals.
    pub fn message(&self) -> String {
        match self {
            TransactionError::AgentNotFound(id) => format!("Agent not found: {}", id),
            TransactionError::UserNotFound(id) => format!("User not found: {}", id),
            TransactionError::ProductUnavailable { product, reason } => {
                format!("Product '{}' is unavailable: {}", product, reason)
            }
            TransactionError::InvalidInput { field, message } => {
                format!("Invalid '{}': {}", field, message)
            }
            TransactionError::AlreadyGranted { agent_id, .. } => {
                format!("Contact networks of agent {} are already unlocked", agent_id)
            }
            TransactionError::PaymentDeclined { ledger_id, .. } => {
                format!("Payment {} was declined", ledger_id)
            }
            TransactionError::GatewayUnreachable { ledger_id, .. } => {
                format!("Payment {} could not be completed, try again", ledger_id)
            }
            TransactionError::PersistenceConflict(_) => {
                "Concurrent update detected, try again".to_string()
            }
            TransactionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// True when retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransactionError::GatewayUnreachable { .. } | TransactionError::PersistenceConflict(_)
        )
    }

    /// True for both flavours of a failed charge; each leaves a REJECTED entry.
    pub fn is_payment_declined(&self) -> bool {
        matches!(
            self,
            TransactionError::PaymentDeclined { .. } | TransactionError::GatewayUnreachable { .. }
        )
    }

    /// Ledger entry recorded for this failure, if any.
    pub fn ledger_id(&self) -> Option<&LedgerEntryId> {
        match self {
            TransactionError::PaymentDeclined { ledger_id, .. }
            | TransactionError::GatewayUnreachable { ledger_id, .. } => Some(ledger_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for TransactionError {}

impl From<ValidationError> for TransactionError {
    fn from(err: ValidationError) -> Self {
        TransactionError::InvalidInput {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for TransactionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PersistenceConflict => TransactionError::PersistenceConflict(err.message),
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                TransactionError::InvalidInput {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "request".to_string()),
                    message: err.message,
                }
            }
            _ => TransactionError::Infrastructure(err.to_string()),
        }
    }
}
