//! Unlock store port - the atomic unit behind a contact unlock.
//!
//! `begin_unlock` serializes every writer of one (user, agent) pair. The
//! returned transaction re-reads the agent and the existing grant under that
//! serialization, may be held across the gateway call, and then either
//! commits the outcome atomically or is dropped (which rolls back).
//!
//! Implementations must use a primitive that works across processes (a
//! database transaction plus lock), not only an in-process mutex.

use async_trait::async_trait;

use crate::domain::access::{AccessGrant, Agent};
use crate::domain::foundation::{AgentId, DomainError, UserId};
use crate::domain::payment::LedgerEntry;

#[async_trait]
pub trait UnlockStore: Send + Sync {
    /// Reads an agent outside any transaction.
    async fn find_agent(&self, agent_id: &AgentId) -> Result<Option<Agent>, DomainError>;

    /// Opens the atomic unit for the pair, blocking while another unit for the
    /// same pair is open.
    async fn begin_unlock(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Box<dyn UnlockTransaction>, DomainError>;
}

/// What an unlock unit writes on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Approved ledger entry plus the grant that references it.
    Granted { entry: LedgerEntry, grant: AccessGrant },
    /// Rejected ledger entry and nothing else.
    Rejected { entry: LedgerEntry },
}

impl UnlockOutcome {
    pub fn entry(&self) -> &LedgerEntry {
        match self {
            UnlockOutcome::Granted { entry, .. } | UnlockOutcome::Rejected { entry } => entry,
        }
    }
}

/// Open atomic unit for one (user, agent) pair.
#[async_trait]
pub trait UnlockTransaction: Send {
    /// Agent as read inside the unit.
    fn agent(&self) -> Option<&Agent>;

    /// Grant already held by the pair, as read inside the unit.
    fn existing_grant(&self) -> Option<&AccessGrant>;

    /// Writes the outcome atomically.
    ///
    /// # Errors
    ///
    /// - `AlreadyGranted` if a grant for the pair appeared anyway
    /// - `PersistenceConflict` / `DatabaseError` on write failure; nothing is
    ///   persisted in either case
    async fn commit(self: Box<Self>, outcome: UnlockOutcome) -> Result<(), DomainError>;

    /// Releases the unit without writing.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
