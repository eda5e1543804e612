//! Gateway call shared by the unlock and charge flows.
//!
//! Every call is bounded by a timeout. Whatever happens, the caller ends up
//! with a [`Settlement`] it can write into its PENDING ledger entry; a
//! timed-out or failed call is a rejection, never a dangling PENDING entry.

use std::time::Duration;

use crate::domain::foundation::{Money, Timestamp};
use crate::domain::payment::{LedgerEntry, TransactionError};
use crate::ports::{ChargeRequest, PaymentGateway};

/// Charge parameters that come from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSettings {
    pub currency: String,
    pub gateway_timeout: Duration,
    /// Unlock price of agents without one.
    pub default_access_price: Money,
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            currency: "PEN".to_string(),
            gateway_timeout: Duration::from_secs(15),
            default_access_price: Money::from_minor(1000).unwrap_or(Money::ZERO),
        }
    }
}

/// How a gateway call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settlement {
    Approved {
        charge_id: String,
    },
    Declined {
        charge_id: Option<String>,
        reason: String,
        /// Gateway was unreachable or timed out rather than answering "no".
        unreachable: bool,
    },
}

impl Settlement {
    pub(crate) fn charge_id(&self) -> Option<&str> {
        match self {
            Settlement::Approved { charge_id } => Some(charge_id),
            Settlement::Declined { charge_id, .. } => charge_id.as_deref(),
        }
    }

    /// Writes the terminal status into a PENDING entry.
    pub(crate) fn apply_to(&self, entry: &mut LedgerEntry, now: Timestamp) -> Result<(), TransactionError> {
        let result = match self {
            Settlement::Approved { charge_id } => entry.approve(charge_id.clone(), now),
            Settlement::Declined {
                charge_id, reason, ..
            } => entry.reject(charge_id.clone(), reason.clone(), now),
        };
        result.map_err(|e| TransactionError::infrastructure(e.to_string()))
    }

    /// Error to surface for a declined settlement.
    pub(crate) fn into_error(self, entry: &LedgerEntry) -> Option<TransactionError> {
        match self {
            Settlement::Approved { .. } => None,
            Settlement::Declined {
                reason,
                unreachable: true,
                ..
            } => Some(TransactionError::gateway_unreachable(entry.id.clone(), reason)),
            Settlement::Declined { reason, .. } => {
                Some(TransactionError::payment_declined(entry.id.clone(), reason))
            }
        }
    }
}

/// Calls the gateway once, bounded by `timeout`.
pub(crate) async fn charge_within(
    gateway: &dyn PaymentGateway,
    request: ChargeRequest,
    timeout: Duration,
) -> Settlement {
    match tokio::time::timeout(timeout, gateway.charge(request)).await {
        Ok(Ok(result)) if result.is_approved() => Settlement::Approved {
            charge_id: result.gateway_charge_id,
        },
        Ok(Ok(result)) => Settlement::Declined {
            charge_id: Some(result.gateway_charge_id),
            reason: if result.outcome_type.is_empty() {
                "missing outcome".to_string()
            } else {
                result.outcome_type
            },
            unreachable: false,
        },
        Ok(Err(err)) => Settlement::Declined {
            charge_id: None,
            unreachable: err.is_unreachable(),
            reason: err.to_string(),
        },
        Err(_) => Settlement::Declined {
            charge_id: None,
            reason: format!("gateway timed out after {}ms", timeout.as_millis()),
            unreachable: true,
        },
    }
}
