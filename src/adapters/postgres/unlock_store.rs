//! PostgreSQL unlock unit.
//!
//! `begin_unlock` opens a transaction and takes a transaction-scoped advisory
//! lock on the grant key, so every process serializes on the same pair. The
//! grant insert is `ON CONFLICT DO NOTHING` on the primary key; zero affected
//! rows means another writer got there first. Dropping the transaction
//! handle rolls everything back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::access::{AccessGrant, Agent};
use crate::domain::foundation::{AgentId, DomainError, ErrorCode, GrantId, UserId};
use crate::ports::{UnlockOutcome, UnlockStore, UnlockTransaction};

use super::rows::{bind_ledger_insert, db_error, AgentRow, GrantRow};

const SELECT_AGENT: &str = r#"
    SELECT id, role, display_name, access_price_minor, contact_networks
    FROM collaborators WHERE id = $1
"#;

pub struct PostgresUnlockStore {
    pool: PgPool,
}

impl PostgresUnlockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnlockStore for PostgresUnlockStore {
    async fn find_agent(&self, agent_id: &AgentId) -> Result<Option<Agent>, DomainError> {
        let row: Option<AgentRow> = sqlx::query_as(SELECT_AGENT)
            .bind(agent_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read agent", e))?;
        row.map(Agent::try_from).transpose()
    }

    async fn begin_unlock(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Box<dyn UnlockTransaction>, DomainError> {
        let key = GrantId::for_pair(user_id, agent_id);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to open unlock transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock grant key", e))?;

        let agent: Option<AgentRow> = sqlx::query_as(SELECT_AGENT)
            .bind(agent_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to read agent", e))?;

        let grant: Option<GrantRow> = sqlx::query_as(
            "SELECT user_id, agent_id, payment_id, granted_at FROM access_grants WHERE id = $1",
        )
        .bind(key.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to read grant", e))?;

        Ok(Box::new(PostgresUnlockTransaction {
            tx,
            key,
            agent: agent.map(Agent::try_from).transpose()?,
            existing_grant: grant.map(AccessGrant::try_from).transpose()?,
        }))
    }
}

struct PostgresUnlockTransaction {
    tx: Transaction<'static, Postgres>,
    key: GrantId,
    agent: Option<Agent>,
    existing_grant: Option<AccessGrant>,
}

#[async_trait]
impl UnlockTransaction for PostgresUnlockTransaction {
    fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    fn existing_grant(&self) -> Option<&AccessGrant> {
        self.existing_grant.as_ref()
    }

    async fn commit(self: Box<Self>, outcome: UnlockOutcome) -> Result<(), DomainError> {
        let PostgresUnlockTransaction { mut tx, key, .. } = *self;

        bind_ledger_insert(outcome.entry())
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DomainError::conflict(format!("ledger entry {} already exists", outcome.entry().id))
                }
                _ => db_error("Failed to write ledger entry", e),
            })?;

        if let UnlockOutcome::Granted { grant, .. } = &outcome {
            if grant.id != key {
                return Err(DomainError::validation("grant", "grant does not match the locked pair"));
            }
            let inserted = sqlx::query(
                r#"
                INSERT INTO access_grants (id, user_id, agent_id, payment_id, access_type, granted_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(grant.id.as_str())
            .bind(grant.user_id.as_str())
            .bind(grant.agent_id.as_str())
            .bind(grant.payment_id.as_str())
            .bind(grant.access_type.as_str())
            .bind(*grant.granted_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to write access grant", e))?;

            if inserted.rows_affected() == 0 {
                return Err(DomainError::new(
                    ErrorCode::AlreadyGranted,
                    format!("grant {} already exists", grant.id),
                ));
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit unlock", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| db_error("Failed to roll back unlock", e))
    }
}
