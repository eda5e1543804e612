//! HTTP DTOs for the unlock, payment and webhook endpoints.
//!
//! Field names are camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    AccessBasis, AccessView, AgentStats, ChargePaymentResult, UnlockContactResult,
};
use crate::domain::payment::{LedgerEntry, PaymentKind};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/collaborators/:agentId/unlock`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub payment_source_token: String,
}

/// Query of `GET /api/collaborators/:agentId/access`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessQuery {
    pub user_id: Option<String>,
}

/// Body of `POST /api/payments/charge`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    #[serde(default)]
    pub user_id: String,
    pub email: Option<String>,
    /// Kept as a string so aliases and unknown kinds reach the handler.
    pub payment_kind: Option<String>,
    pub source_token: Option<String>,
    pub agent_id: Option<String>,
    pub product_id: Option<String>,
    #[serde(default)]
    pub save_card: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub success: bool,
    pub message: String,
    pub ledger_id: String,
    pub granted: bool,
}

impl From<UnlockContactResult> for UnlockResponse {
    fn from(result: UnlockContactResult) -> Self {
        Self {
            success: true,
            message: result.message,
            ledger_id: result.ledger_id.to_string(),
            granted: result.granted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub agent_id: String,
    pub has_access: bool,
    /// `premium`, `grant` or `none`.
    pub basis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_networks: Option<BTreeMap<String, String>>,
}

impl From<AccessView> for AccessResponse {
    fn from(view: AccessView) -> Self {
        let basis = match view.basis {
            AccessBasis::Premium => "premium",
            AccessBasis::Grant => "grant",
            AccessBasis::None => "none",
        };
        Self {
            agent_id: view.agent_id.to_string(),
            has_access: view.has_access,
            basis: basis.to_string(),
            contact_networks: view.contact_networks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub agent_id: String,
    pub total_accesses: u64,
    pub access_price: f64,
    pub revenue: f64,
}

impl From<AgentStats> for StatsResponse {
    fn from(stats: AgentStats) -> Self {
        Self {
            agent_id: stats.agent_id.to_string(),
            total_accesses: stats.total_accesses,
            access_price: stats.access_price.as_major(),
            revenue: stats.revenue.as_major(),
        }
    }
}

/// One ledger entry as shown to its owner. Decline reasons stay internal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResponse {
    pub id: String,
    pub kind: PaymentKind,
    pub status: String,
    /// Major units, e.g. `15.0`.
    pub amount: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_charge_id: Option<String>,
    pub created_at: String,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            agent_id: entry.target.agent_id().map(ToString::to_string),
            product_id: entry.target.product_id().map(ToString::to_string),
            id: entry.id.to_string(),
            kind: entry.kind,
            status: entry.status.as_str().to_uppercase(),
            amount: entry.amount.as_major(),
            currency: entry.currency,
            gateway_charge_id: entry.gateway_charge_id,
            created_at: entry.created_at.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    pub success: bool,
    pub payment: LedgerEntryResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<String>,
}

impl From<ChargePaymentResult> for ChargeResponse {
    fn from(result: ChargePaymentResult) -> Self {
        Self {
            success: true,
            payment: LedgerEntryResponse::from(result.entry),
            premium_until: result.premium_until.map(|t| t.to_string()),
        }
    }
}

/// Generic webhook acknowledgement; never carries gateway details.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    pub fn error() -> Self {
        Self { status: "error" }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error_code: String,
    pub message: String,
    /// Ledger entry recorded for a failed charge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.into(),
            message: message.into(),
            ledger_id: None,
        }
    }

    pub fn with_ledger_id(mut self, ledger_id: impl Into<String>) -> Self {
        self.ledger_id = Some(ledger_id.into());
        self
    }
}
