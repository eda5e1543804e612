//! In-memory unlock unit: per-pair lock plus a single-lock commit.

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::access::{AccessGrant, Agent};
use crate::domain::foundation::{AgentId, DomainError, ErrorCode, GrantId, UserId};
use crate::ports::{UnlockOutcome, UnlockStore, UnlockTransaction};

use super::InMemoryStore;

#[async_trait]
impl UnlockStore for InMemoryStore {
    async fn find_agent(&self, agent_id: &AgentId) -> Result<Option<Agent>, DomainError> {
        Ok(self.inner.data.read().await.agents.get(agent_id).cloned())
    }

    async fn begin_unlock(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Box<dyn UnlockTransaction>, DomainError> {
        let key = GrantId::for_pair(user_id, agent_id);
        let guard = self.pair_lock(&key).await.lock_owned().await;

        let (agent, existing_grant) = {
            let data = self.inner.data.read().await;
            (data.agents.get(agent_id).cloned(), data.grants.get(&key).cloned())
        };

        Ok(Box::new(InMemoryUnlockTransaction {
            store: self.clone(),
            key,
            agent,
            existing_grant,
            _guard: guard,
        }))
    }
}

struct InMemoryUnlockTransaction {
    store: InMemoryStore,
    key: GrantId,
    agent: Option<Agent>,
    existing_grant: Option<AccessGrant>,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl UnlockTransaction for InMemoryUnlockTransaction {
    fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    fn existing_grant(&self) -> Option<&AccessGrant> {
        self.existing_grant.as_ref()
    }

    async fn commit(self: Box<Self>, outcome: UnlockOutcome) -> Result<(), DomainError> {
        let mut data = self.store.inner.data.write().await;

        if self.store.take_commit_failure() {
            return Err(DomainError::database("injected commit failure"));
        }

        let entry = outcome.entry();
        if data.ledger.contains_key(&entry.id) {
            return Err(DomainError::conflict(format!(
                "ledger entry {} already exists",
                entry.id
            )));
        }

        match outcome {
            UnlockOutcome::Granted { entry, grant } => {
                if grant.id != self.key {
                    return Err(DomainError::validation("grant", "grant does not match the locked pair"));
                }
                if data.grants.contains_key(&grant.id) {
                    return Err(DomainError::new(
                        ErrorCode::AlreadyGranted,
                        format!("grant {} already exists", grant.id),
                    ));
                }
                data.ledger.insert(entry.id.clone(), entry);
                data.grants.insert(grant.id.clone(), grant);
            }
            UnlockOutcome::Rejected { entry } => {
                data.ledger.insert(entry.id.clone(), entry);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::AgentRole;
    use crate::domain::foundation::{Money, Timestamp};
    use crate::domain::payment::{LedgerEntry, PaymentKind, PaymentTarget};
    use std::time::Duration;

    fn ids() -> (UserId, AgentId) {
        (UserId::new("u1").unwrap(), AgentId::new("a1").unwrap())
    }

    fn approved_outcome(user: &UserId, agent: &AgentId) -> UnlockOutcome {
        let now = Timestamp::now();
        let mut entry = LedgerEntry::pending(
            user.clone(),
            PaymentTarget::Agent { agent_id: agent.clone() },
            PaymentKind::OneTime,
            Money::from_major(10.0).unwrap(),
            "PEN",
            now,
        );
        entry.approve("chr_1", now).unwrap();
        let grant = AccessGrant::new(user.clone(), agent.clone(), entry.id.clone(), now);
        UnlockOutcome::Granted { entry, grant }
    }

    #[tokio::test]
    async fn second_unit_for_same_pair_waits_for_first() {
        let store = InMemoryStore::new();
        let (user, agent) = ids();
        store
            .insert_agent(Agent::new(agent.clone(), AgentRole::Guide, "Ana"))
            .await;

        let first = store.begin_unlock(&user, &agent).await.unwrap();

        let contender = {
            let store = store.clone();
            let (user, agent) = (user.clone(), agent.clone());
            tokio::spawn(async move {
                let tx = store.begin_unlock(&user, &agent).await.unwrap();
                tx.existing_grant().is_some()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        first.commit(approved_outcome(&user, &agent)).await.unwrap();
        assert!(contender.await.unwrap(), "contender must observe the committed grant");
    }

    #[tokio::test]
    async fn dropped_unit_writes_nothing() {
        let store = InMemoryStore::new();
        let (user, agent) = ids();
        let tx = store.begin_unlock(&user, &agent).await.unwrap();
        drop(tx);

        assert!(store.ledger_entries().await.is_empty());
        let again = store.begin_unlock(&user, &agent).await.unwrap();
        assert!(again.existing_grant().is_none());
    }

    #[tokio::test]
    async fn injected_failure_leaves_store_untouched() {
        let store = InMemoryStore::new();
        let (user, agent) = ids();
        store.fail_next_commit();

        let tx = store.begin_unlock(&user, &agent).await.unwrap();
        let err = tx.commit(approved_outcome(&user, &agent)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(store.ledger_entries().await.is_empty());
        assert!(store.grants().await.is_empty());
    }

    #[tokio::test]
    async fn finished_units_release_their_pair_locks() {
        let store = InMemoryStore::new();
        let user = UserId::new("u1").unwrap();
        for i in 0..5 {
            let agent = AgentId::new(format!("a{i}")).unwrap();
            let tx = store.begin_unlock(&user, &agent).await.unwrap();
            assert_eq!(store.pair_lock_count().await, 1);
            tx.rollback().await.unwrap();
        }

        let held = store.begin_unlock(&user, &AgentId::new("a0").unwrap()).await.unwrap();
        let other = store.begin_unlock(&user, &AgentId::new("a1").unwrap()).await.unwrap();
        assert_eq!(store.pair_lock_count().await, 2);
        held.rollback().await.unwrap();
        other.rollback().await.unwrap();
    }
}
