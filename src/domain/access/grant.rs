//! Access grants linking a user to an agent's contact networks.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AgentId, GrantId, LedgerEntryId, Timestamp, UserId};

/// What a grant unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    ContactNetworks,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::ContactNetworks => "contact_networks",
        }
    }
}

/// Permanent right of a user to see one agent's contact networks.
///
/// # Invariants
///
/// - At most one grant exists per (user, agent) pair; `id` is derived from it.
/// - `payment_id` always references an APPROVED ledger entry written in the
///   same atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: GrantId,
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub payment_id: LedgerEntryId,
    pub access_type: AccessType,
    pub granted_at: Timestamp,
}

impl AccessGrant {
    pub fn new(
        user_id: UserId,
        agent_id: AgentId,
        payment_id: LedgerEntryId,
        granted_at: Timestamp,
    ) -> Self {
        Self {
            id: GrantId::for_pair(&user_id, &agent_id),
            user_id,
            agent_id,
            payment_id,
            access_type: AccessType::ContactNetworks,
            granted_at,
        }
    }
}
