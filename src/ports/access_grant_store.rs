//! Access grant store port (read side).
//!
//! Grants are written only by [`UnlockTransaction::commit`](super::UnlockTransaction::commit).

use async_trait::async_trait;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{AgentId, DomainError, UserId};

#[async_trait]
pub trait AccessGrantStore: Send + Sync {
    async fn has_grant(&self, user_id: &UserId, agent_id: &AgentId) -> Result<bool, DomainError>;

    async fn find_grant(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Option<AccessGrant>, DomainError>;

    /// Number of users holding a grant for the agent.
    async fn count_for_agent(&self, agent_id: &AgentId) -> Result<u64, DomainError>;
}
