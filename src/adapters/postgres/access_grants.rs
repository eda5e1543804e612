//! PostgreSQL implementation of AccessGrantStore (reads only; grants are
//! written by the unlock unit).

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{AgentId, DomainError, GrantId, UserId};
use crate::ports::AccessGrantStore;

use super::rows::{db_error, GrantRow};

pub struct PostgresAccessGrants {
    pool: PgPool,
}

impl PostgresAccessGrants {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessGrantStore for PostgresAccessGrants {
    async fn has_grant(&self, user_id: &UserId, agent_id: &AgentId) -> Result<bool, DomainError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM access_grants WHERE id = $1)")
                .bind(GrantId::for_pair(user_id, agent_id).as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("Failed to check grant", e))?;
        Ok(exists)
    }

    async fn find_grant(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Option<AccessGrant>, DomainError> {
        let row: Option<GrantRow> = sqlx::query_as(
            "SELECT user_id, agent_id, payment_id, granted_at FROM access_grants WHERE id = $1",
        )
        .bind(GrantId::for_pair(user_id, agent_id).as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read grant", e))?;
        row.map(AccessGrant::try_from).transpose()
    }

    async fn count_for_agent(&self, agent_id: &AgentId) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM access_grants WHERE agent_id = $1")
            .bind(agent_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count grants", e))?;
        Ok(count.max(0) as u64)
    }
}
