//! CheckAccessHandler - Query whether a user may see an agent's contact networks.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::{AgentId, Timestamp, UserId};
use crate::domain::payment::TransactionError;
use crate::ports::{AccessGrantStore, UnlockStore, UserRepository};

/// Query for access to one agent. Anonymous viewers pass no user id.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub agent_id: String,
    pub user_id: Option<String>,
}

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBasis {
    Premium,
    Grant,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessView {
    pub agent_id: AgentId,
    pub has_access: bool,
    pub basis: AccessBasis,
    /// Present only when `has_access`.
    pub contact_networks: Option<BTreeMap<String, String>>,
}

pub struct CheckAccessHandler {
    store: Arc<dyn UnlockStore>,
    grants: Arc<dyn AccessGrantStore>,
    users: Arc<dyn UserRepository>,
}

impl CheckAccessHandler {
    pub fn new(
        store: Arc<dyn UnlockStore>,
        grants: Arc<dyn AccessGrantStore>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            store,
            grants,
            users,
        }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<AccessView, TransactionError> {
        let agent_id = AgentId::new(query.agent_id)?;
        let agent = self
            .store
            .find_agent(&agent_id)
            .await?
            .filter(|a| a.is_gated())
            .ok_or_else(|| TransactionError::agent_not_found(agent_id.clone()))?;

        let basis = match query.user_id.filter(|id| !id.trim().is_empty()) {
            None => AccessBasis::None,
            Some(raw) => {
                let user_id = UserId::new(raw)?;
                self.basis_for(&user_id, &agent_id).await?
            }
        };

        let has_access = basis != AccessBasis::None;
        Ok(AccessView {
            agent_id,
            has_access,
            basis,
            contact_networks: has_access.then_some(agent.contact_networks),
        })
    }

    async fn basis_for(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<AccessBasis, TransactionError> {
        let premium = self
            .users
            .find_by_id(user_id)
            .await?
            .is_some_and(|u| u.effective_premium_at(Timestamp::now()));
        if premium {
            return Ok(AccessBasis::Premium);
        }
        if self.grants.has_grant(user_id, agent_id).await? {
            return Ok(AccessBasis::Grant);
        }
        Ok(AccessBasis::None)
    }
}
