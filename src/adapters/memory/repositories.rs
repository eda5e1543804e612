//! In-memory implementations of the ledger and read ports.

use async_trait::async_trait;

use crate::domain::access::AccessGrant;
use crate::domain::foundation::{
    AgentId, DomainError, ErrorCode, GrantId, LedgerEntryId, ProductId, Timestamp, UserId,
};
use crate::domain::payment::{LedgerEntry, LedgerStatus, Product};
use crate::domain::subscription::User;
use crate::ports::{
    AccessGrantStore, ClaimResult, EventStatus, ProductCatalog, TransactionLedger, UserRepository,
    WebhookEventRecord, WebhookEventRepository,
};

use super::InMemoryStore;

#[async_trait]
impl TransactionLedger for InMemoryStore {
    async fn record(&self, entry: &LedgerEntry) -> Result<(), DomainError> {
        let mut data = self.inner.data.write().await;
        if data.ledger.contains_key(&entry.id) {
            return Err(DomainError::conflict(format!(
                "ledger entry {} already exists",
                entry.id
            )));
        }
        data.ledger.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn settle(&self, entry: &LedgerEntry) -> Result<(), DomainError> {
        let mut data = self.inner.data.write().await;
        let stored = data.ledger.get_mut(&entry.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::LedgerEntryNotFound,
                format!("ledger entry {} not found", entry.id),
            )
        })?;
        if stored.status != LedgerStatus::Pending {
            return Err(DomainError::conflict(format!(
                "ledger entry {} is already {}",
                entry.id,
                stored.status.as_str()
            )));
        }
        *stored = entry.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &LedgerEntryId) -> Result<Option<LedgerEntry>, DomainError> {
        Ok(self.inner.data.read().await.ledger.get(id).cloned())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, DomainError> {
        let data = self.inner.data.read().await;
        let mut entries: Vec<_> = data
            .ledger
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

#[async_trait]
impl AccessGrantStore for InMemoryStore {
    async fn has_grant(&self, user_id: &UserId, agent_id: &AgentId) -> Result<bool, DomainError> {
        let key = GrantId::for_pair(user_id, agent_id);
        Ok(self.inner.data.read().await.grants.contains_key(&key))
    }

    async fn find_grant(
        &self,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Option<AccessGrant>, DomainError> {
        let key = GrantId::for_pair(user_id, agent_id);
        Ok(self.inner.data.read().await.grants.get(&key).cloned())
    }

    async fn count_for_agent(&self, agent_id: &AgentId) -> Result<u64, DomainError> {
        let data = self.inner.data.read().await;
        Ok(data.grants.values().filter(|g| &g.agent_id == agent_id).count() as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.inner.data.read().await.users.get(user_id).cloned())
    }

    async fn set_premium_until(&self, user_id: &UserId, until: Timestamp) -> Result<bool, DomainError> {
        let mut data = self.inner.data.write().await;
        match data.users.get_mut(user_id) {
            Some(user) => {
                user.extend_premium_until(until);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_card_token(&self, user_id: &UserId, token: &str) -> Result<bool, DomainError> {
        let mut data = self.inner.data.write().await;
        match data.users.get_mut(user_id) {
            Some(user) => {
                user.save_card_token(token);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError> {
        Ok(self.inner.data.read().await.products.get(product_id).cloned())
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryStore {
    async fn find_by_key(&self, event_key: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.inner.data.read().await.webhook_events.get(event_key).cloned())
    }

    async fn claim(
        &self,
        record: WebhookEventRecord,
        stale_before: Timestamp,
    ) -> Result<ClaimResult, DomainError> {
        let mut data = self.inner.data.write().await;
        if let Some(existing) = data.webhook_events.get_mut(&record.event_key) {
            if existing.status == EventStatus::Processing && existing.claimed_at.is_before(&stale_before) {
                existing.claimed_at = record.claimed_at;
                existing.payload = record.payload;
                return Ok(ClaimResult::Claimed);
            }
            return Ok(ClaimResult::AlreadyClaimed(existing.status));
        }
        data.webhook_events.insert(record.event_key.clone(), record);
        Ok(ClaimResult::Claimed)
    }

    async fn complete(
        &self,
        event_key: &str,
        status: EventStatus,
        detail: Option<String>,
    ) -> Result<(), DomainError> {
        let mut data = self.inner.data.write().await;
        let record = data.webhook_events.get_mut(event_key).ok_or_else(|| {
            DomainError::database(format!("webhook event {} was never claimed", event_key))
        })?;
        record.status = status;
        record.detail = detail;
        Ok(())
    }

    async fn release(&self, event_key: &str) -> Result<(), DomainError> {
        let mut data = self.inner.data.write().await;
        if matches!(
            data.webhook_events.get(event_key).map(|r| r.status),
            Some(EventStatus::Processing)
        ) {
            data.webhook_events.remove(event_key);
        }
        Ok(())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let mut data = self.inner.data.write().await;
        let before = data.webhook_events.len();
        data.webhook_events.retain(|_, r| !r.received_at.is_before(&timestamp));
        Ok((before - data.webhook_events.len()) as u64)
    }
}
