//! AgentStatsHandler - Unlock count and revenue of one agent.

use std::sync::Arc;

use crate::domain::foundation::{AgentId, Money};
use crate::domain::payment::TransactionError;
use crate::ports::{AccessGrantStore, UnlockStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStats {
    pub agent_id: AgentId,
    pub total_accesses: u64,
    pub access_price: Money,
    /// `total_accesses × access_price` at the current price.
    pub revenue: Money,
}

pub struct AgentStatsHandler {
    store: Arc<dyn UnlockStore>,
    grants: Arc<dyn AccessGrantStore>,
    default_access_price: Money,
}

impl AgentStatsHandler {
    pub fn new(
        store: Arc<dyn UnlockStore>,
        grants: Arc<dyn AccessGrantStore>,
        default_access_price: Money,
    ) -> Self {
        Self {
            store,
            grants,
            default_access_price,
        }
    }

    pub async fn handle(&self, agent_id: &str) -> Result<AgentStats, TransactionError> {
        let agent_id = AgentId::new(agent_id)?;
        let agent = self
            .store
            .find_agent(&agent_id)
            .await?
            .filter(|a| a.is_gated())
            .ok_or_else(|| TransactionError::agent_not_found(agent_id.clone()))?;

        let total_accesses = self.grants.count_for_agent(&agent_id).await?;
        let access_price = agent.price_or(self.default_access_price);

        Ok(AgentStats {
            agent_id,
            total_accesses,
            access_price,
            revenue: access_price.times(total_accesses),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::culqi::MockGateway;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::charging::ChargeSettings;
    use crate::application::handlers::access::{UnlockContactCommand, UnlockContactHandler};
    use crate::domain::access::{Agent, AgentRole};
    use crate::domain::foundation::UserId;
    use crate::domain::subscription::User;

    #[tokio::test]
    async fn revenue_is_count_times_price() {
        let store = InMemoryStore::new();
        store
            .insert_agent(
                Agent::new(AgentId::new("a1").unwrap(), AgentRole::Artisan, "Taller")
                    .with_access_price(12.5)
                    .unwrap(),
            )
            .await;
        let unlock = UnlockContactHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(MockGateway::new()),
            ChargeSettings::default(),
        );
        for user in ["u1", "u2", "u3"] {
            store
                .insert_user(User::new(UserId::new(user).unwrap(), format!("{}@example.com", user)))
                .await;
            unlock
                .handle(UnlockContactCommand {
                    agent_id: "a1".to_string(),
                    user_id: user.to_string(),
                    payment_source_token: "tkn".to_string(),
                })
                .await
                .unwrap();
        }

        let handler = AgentStatsHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Money::from_major(10.0).unwrap(),
        );
        let stats = handler.handle("a1").await.unwrap();

        assert_eq!(stats.total_accesses, 3);
        assert_eq!(stats.revenue.as_major(), 37.5);
    }

    #[tokio::test]
    async fn agent_without_unlocks_has_zero_revenue() {
        let store = InMemoryStore::new();
        store
            .insert_agent(Agent::new(AgentId::new("a1").unwrap(), AgentRole::Guide, "Guía"))
            .await;
        let handler = AgentStatsHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Money::from_major(10.0).unwrap(),
        );

        let stats = handler.handle("a1").await.unwrap();

        assert_eq!(stats.total_accesses, 0);
        assert_eq!(stats.access_price.as_major(), 10.0);
        assert_eq!(stats.revenue, Money::ZERO);
    }

    #[tokio::test]
    async fn unknown_agent_is_not_found() {
        let store = InMemoryStore::new();
        let handler = AgentStatsHandler::new(
            Arc::new(store.clone()),
            Arc::new(store),
            Money::from_major(10.0).unwrap(),
        );
        assert!(matches!(
            handler.handle("nobody").await,
            Err(TransactionError::AgentNotFound(_))
        ));
    }
}
