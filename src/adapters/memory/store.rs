//! Shared in-memory document store.
//!
//! One `InMemoryStore` implements every storage port. Clones share state, so
//! a test can hand the same store to several handlers and inspect it
//! afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::domain::access::{AccessGrant, Agent};
use crate::domain::foundation::{AgentId, GrantId, LedgerEntryId, ProductId, UserId};
use crate::domain::payment::{LedgerEntry, Product};
use crate::domain::subscription::User;
use crate::ports::WebhookEventRecord;

#[derive(Default)]
pub(super) struct Collections {
    pub agents: HashMap<AgentId, Agent>,
    pub users: HashMap<UserId, User>,
    pub products: HashMap<ProductId, Product>,
    pub ledger: HashMap<LedgerEntryId, LedgerEntry>,
    pub grants: HashMap<GrantId, AccessGrant>,
    pub webhook_events: HashMap<String, WebhookEventRecord>,
}

pub(super) struct StoreInner {
    /// All collections behind one lock so a commit touching several of them
    /// is atomic.
    pub data: RwLock<Collections>,
    /// One lock per (user, agent) pair, held by an open unlock transaction.
    pub pair_locks: Mutex<HashMap<GrantId, Arc<Mutex<()>>>>,
    pub fail_next_commit: AtomicBool,
}

/// In-memory implementation of all storage ports.
#[derive(Clone)]
pub struct InMemoryStore {
    pub(super) inner: Arc<StoreInner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                data: RwLock::new(Collections::default()),
                pair_locks: Mutex::new(HashMap::new()),
                fail_next_commit: AtomicBool::new(false),
            }),
        }
    }

    pub async fn insert_agent(&self, agent: Agent) {
        self.inner.data.write().await.agents.insert(agent.id.clone(), agent);
    }

    pub async fn insert_user(&self, user: User) {
        self.inner.data.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn insert_product(&self, product: Product) {
        self.inner.data.write().await.products.insert(product.id.clone(), product);
    }

    /// Makes the next unlock commit fail after its checks, writing nothing.
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub(super) fn take_commit_failure(&self) -> bool {
        self.inner.fail_next_commit.swap(false, Ordering::SeqCst)
    }

    pub async fn ledger_entries(&self) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = self.inner.data.read().await.ledger.values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        entries
    }

    pub async fn grants(&self) -> Vec<AccessGrant> {
        self.inner.data.read().await.grants.values().cloned().collect()
    }

    pub async fn user(&self, user_id: &UserId) -> Option<User> {
        self.inner.data.read().await.users.get(user_id).cloned()
    }

    /// Lock guarding the pair, created on first use.
    ///
    /// Locks no unit holds or waits on are dropped on the way in, so the map
    /// only keeps pairs with a live unit.
    pub(super) async fn pair_lock(&self, key: &GrantId) -> Arc<Mutex<()>> {
        let mut locks = self.inner.pair_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub(super) async fn pair_lock_count(&self) -> usize {
        self.inner.pair_locks.lock().await.len()
    }
}
