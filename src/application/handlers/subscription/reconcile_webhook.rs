//! ReconcileWebhookHandler - Apply gateway notifications exactly once.
//!
//! Flow per delivery:
//! 1. Parse the body leniently
//! 2. Claim the event key; duplicates stop here
//! 3. Apply the effect (subscription extension) or mark the event ignored
//! 4. On failure release the claim so the redelivery can retry
//!
//! Steps 3 and 4 run on a spawned task, so a dropped request does not strand
//! the claim. A claim stranded anyway (process crash) is taken over by the
//! first redelivery once its lease has run out.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::payment::TransactionError;
use crate::domain::subscription::{EventAction, GatewayEvent, WebhookError};
use crate::ports::{
    ClaimResult, EventStatus, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};

use super::ExtendSubscriptionHandler;

#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    /// Raw webhook body.
    pub payload: Vec<u8>,
}

/// How long a `Processing` claim shuts out redeliveries.
pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct ReconcileWebhookHandler {
    events: Arc<dyn WebhookEventRepository>,
    extend: ExtendSubscriptionHandler,
    claim_lease: Duration,
}

impl ReconcileWebhookHandler {
    pub fn new(events: Arc<dyn WebhookEventRepository>, extend: ExtendSubscriptionHandler) -> Self {
        Self {
            events,
            extend,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    pub fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    pub async fn handle(&self, cmd: ReconcileWebhookCommand) -> Result<WebhookResult, WebhookError> {
        let event = GatewayEvent::parse(&cmd.payload)?;
        let key = event.dedup_key().to_string();
        let payload: serde_json::Value =
            serde_json::from_slice(&cmd.payload).unwrap_or(serde_json::Value::Null);

        let stale_before = Timestamp::now().minus(self.claim_lease);
        let claim = self
            .events
            .claim(
                WebhookEventRecord::processing(&key, event.event_type(), payload),
                stale_before,
            )
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?;

        match claim {
            ClaimResult::Claimed => {}
            ClaimResult::AlreadyClaimed(EventStatus::Processing) => {
                tracing::info!(event_id = %key, "Webhook event in flight elsewhere");
                return Err(WebhookError::InFlight(key));
            }
            ClaimResult::AlreadyClaimed(status) => {
                tracing::info!(
                    event_id = %key,
                    status = status.as_str(),
                    "Duplicate webhook delivery skipped"
                );
                return Ok(WebhookResult::AlreadyProcessed);
            }
        }

        let this = self.clone();
        tokio::spawn(async move { this.apply(key, event).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Webhook task did not finish");
                WebhookError::Database(format!("webhook task failed: {e}"))
            })?
    }

    /// Runs the effect for a claimed event and settles the claim.
    async fn apply(&self, key: String, event: GatewayEvent) -> Result<WebhookResult, WebhookError> {
        match event.action() {
            EventAction::Ignore { reason } => {
                tracing::debug!(event_id = %key, event_type = event.event_type(), reason, "Webhook event ignored");
                self.finish(&key, EventStatus::Ignored, Some(reason.to_string())).await;
                Ok(WebhookResult::Ignored)
            }
            EventAction::ExtendSubscription { user_id } => {
                match self.extend_for(&user_id).await {
                    Ok(()) => {
                        self.finish(&key, EventStatus::Succeeded, None).await;
                        Ok(WebhookResult::Processed)
                    }
                    Err(err) => {
                        tracing::error!(event_id = %key, user_id = %user_id, error = %err, "Webhook processing failed");
                        if let Err(release_err) = self.events.release(&key).await {
                            tracing::error!(event_id = %key, error = %release_err, "Failed to release webhook claim");
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    async fn extend_for(&self, user_id: &str) -> Result<(), WebhookError> {
        let user_id = UserId::new(user_id).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        match self.extend.handle(&user_id).await {
            Ok(_) => Ok(()),
            Err(TransactionError::UserNotFound(id)) => Err(WebhookError::UserNotFound(id.to_string())),
            Err(other) => Err(WebhookError::Database(other.to_string())),
        }
    }

    /// The effect is already applied; a failure here only loses the audit
    /// status, so it is logged rather than surfaced.
    async fn finish(&self, key: &str, status: EventStatus, detail: Option<String>) {
        if let Err(err) = self.events.complete(key, status, detail).await {
            tracing::error!(event_id = %key, error = %err, "Failed to mark webhook event complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::subscription::{SubscriptionPolicy, User};

    fn handler(store: &InMemoryStore) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            Arc::new(store.clone()),
            ExtendSubscriptionHandler::new(Arc::new(store.clone()), SubscriptionPolicy::default()),
        )
    }

    fn subscription_event(id: &str, user: &str) -> ReconcileWebhookCommand {
        ReconcileWebhookCommand {
            payload: serde_json::to_vec(&serde_json::json!({
                "id": id,
                "type": "subscription.charge.succeeded",
                "data": {"object": {"metadata": {"userId": user}}}
            }))
            .unwrap(),
        }
    }

    async fn store_with_user() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_user(User::new(UserId::new("u1").unwrap(), "u1@example.com"))
            .await;
        store
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Processing
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_event_extends_premium() {
        let store = store_with_user().await;

        let result = handler(&store).handle(subscription_event("evt_1", "u1")).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
        let user = store.user(&UserId::new("u1").unwrap()).await.unwrap();
        assert!(user.effective_premium_at(Timestamp::now()));
    }

    #[tokio::test]
    async fn duplicate_delivery_does_not_extend_again() {
        let store = store_with_user().await;
        let handler = handler(&store);
        handler.handle(subscription_event("evt_1", "u1")).await.unwrap();
        let first_expiry = store
            .user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .premium_expires_at;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let again = handler.handle(subscription_event("evt_1", "u1")).await.unwrap();

        assert_eq!(again, WebhookResult::AlreadyProcessed);
        let second_expiry = store
            .user(&UserId::new("u1").unwrap())
            .await
            .unwrap()
            .premium_expires_at;
        assert_eq!(first_expiry, second_expiry);
    }

    #[tokio::test]
    async fn unknown_event_type_is_ignored() {
        let store = store_with_user().await;
        let cmd = ReconcileWebhookCommand {
            payload: br#"{"id": "evt_9", "type": "order.creation.succeeded"}"#.to_vec(),
        };

        let result = handler(&store).handle(cmd).await.unwrap();

        assert_eq!(result, WebhookResult::Ignored);
        let user = store.user(&UserId::new("u1").unwrap()).await.unwrap();
        assert!(!user.is_premium);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failures
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_user_releases_claim_for_redelivery() {
        let store = InMemoryStore::new();
        let handler = handler(&store);

        let err = handler.handle(subscription_event("evt_2", "late-user")).await.unwrap_err();
        assert!(matches!(err, WebhookError::UserNotFound(_)));
        assert!(err.is_retryable());

        store
            .insert_user(User::new(UserId::new("late-user").unwrap(), "late@example.com"))
            .await;
        let retried = handler.handle(subscription_event("evt_2", "late-user")).await.unwrap();
        assert_eq!(retried, WebhookResult::Processed);
    }

    #[tokio::test]
    async fn redelivery_takes_over_claim_past_its_lease() {
        let store = store_with_user().await;
        let mut stranded = WebhookEventRecord::processing("evt_3", "subscription.charge.succeeded", serde_json::Value::Null);
        stranded.claimed_at = Timestamp::now().minus(DEFAULT_CLAIM_LEASE + Duration::from_secs(60));
        store.claim(stranded, Timestamp::now()).await.unwrap();

        let result = handler(&store).handle(subscription_event("evt_3", "u1")).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
        let record = store.find_by_key("evt_3").await.unwrap().unwrap();
        assert_eq!(record.status, EventStatus::Succeeded);
        let user = store.user(&UserId::new("u1").unwrap()).await.unwrap();
        assert!(user.effective_premium_at(Timestamp::now()));
    }

    #[tokio::test]
    async fn claim_within_lease_is_in_flight() {
        let store = store_with_user().await;
        store
            .claim(
                WebhookEventRecord::processing("evt_4", "subscription.charge.succeeded", serde_json::Value::Null),
                Timestamp::now(),
            )
            .await
            .unwrap();

        let err = handler(&store).handle(subscription_event("evt_4", "u1")).await.unwrap_err();

        assert!(matches!(err, WebhookError::InFlight(_)));
        let user = store.user(&UserId::new("u1").unwrap()).await.unwrap();
        assert!(!user.is_premium);
    }

    #[tokio::test]
    async fn short_lease_hands_over_quickly() {
        let store = store_with_user().await;
        store
            .claim(
                WebhookEventRecord::processing("evt_5", "subscription.charge.succeeded", serde_json::Value::Null),
                Timestamp::now(),
            )
            .await
            .unwrap();
        let handler = handler(&store).with_claim_lease(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(40)).await;
        let result = handler.handle(subscription_event("evt_5", "u1")).await.unwrap();

        assert_eq!(result, WebhookResult::Processed);
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let store = InMemoryStore::new();
        let err = handler(&store)
            .handle(ReconcileWebhookCommand {
                payload: b"{not json".to_vec(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::ParseError(_)));
    }
}
