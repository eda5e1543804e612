//! Ledger entries: one immutable record per charge attempt.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AgentId, LedgerEntryId, Money, ProductId, StateMachine, Timestamp, UserId, ValidationError,
};

use super::PaymentKind;

/// Settlement status of a charge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerStatus {
    /// Recorded before the gateway answered.
    Pending,
    Approved,
    Rejected,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Pending => "pending",
            LedgerStatus::Approved => "approved",
            LedgerStatus::Rejected => "rejected",
        }
    }

    pub fn from_storage(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(LedgerStatus::Pending),
            "approved" => Some(LedgerStatus::Approved),
            "rejected" => Some(LedgerStatus::Rejected),
            _ => None,
        }
    }
}

impl StateMachine for LedgerStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use LedgerStatus::*;
        matches!((self, target), (Pending, Approved) | (Pending, Rejected))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LedgerStatus::*;
        match self {
            Pending => vec![Approved, Rejected],
            Approved | Rejected => vec![],
        }
    }
}

/// What a charge pays for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentTarget {
    /// Unlock of (or one-off payment to) an agent.
    Agent { agent_id: AgentId },
    /// Catalog product, credited to its owner.
    Product {
        product_id: ProductId,
        owner_agent_id: AgentId,
    },
    /// Subscriptions and unattributed charges.
    Platform,
}

impl PaymentTarget {
    /// Agent credited with the payment, if any.
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            PaymentTarget::Agent { agent_id } => Some(agent_id),
            PaymentTarget::Product { owner_agent_id, .. } => Some(owner_agent_id),
            PaymentTarget::Platform => None,
        }
    }

    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            PaymentTarget::Product { product_id, .. } => Some(product_id),
            _ => None,
        }
    }
}

/// Record of one charge attempt.
///
/// # Invariants
///
/// - `id` is generated before the gateway is contacted.
/// - Only `Pending -> Approved | Rejected` happens, exactly once.
/// - An `Approved` entry carries a gateway charge id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub target: PaymentTarget,
    pub kind: PaymentKind,
    pub amount: Money,
    pub currency: String,
    pub gateway_charge_id: Option<String>,
    pub status: LedgerStatus,
    /// Gateway outcome or transport failure behind a rejection. Never shown to users.
    pub decline_reason: Option<String>,
    pub created_at: Timestamp,
    pub settled_at: Option<Timestamp>,
}

impl LedgerEntry {
    /// Starts a new attempt in `Pending`.
    pub fn pending(
        user_id: UserId,
        target: PaymentTarget,
        kind: PaymentKind,
        amount: Money,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            user_id,
            target,
            kind,
            amount,
            currency: currency.into(),
            gateway_charge_id: None,
            status: LedgerStatus::Pending,
            decline_reason: None,
            created_at: now,
            settled_at: None,
        }
    }

    /// Marks the attempt approved by the gateway.
    pub fn approve(
        &mut self,
        gateway_charge_id: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(LedgerStatus::Approved)?;
        self.gateway_charge_id = Some(gateway_charge_id.into());
        self.settled_at = Some(now);
        Ok(())
    }

    /// Marks the attempt rejected. The charge id is known only when the
    /// gateway answered.
    pub fn reject(
        &mut self,
        gateway_charge_id: Option<String>,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(LedgerStatus::Rejected)?;
        self.gateway_charge_id = gateway_charge_id;
        self.decline_reason = Some(reason.into());
        self.settled_at = Some(now);
        Ok(())
    }

    pub fn is_approved(&self) -> bool {
        self.status == LedgerStatus::Approved
    }
}
