//! Gateway notification handling: deduplication, ignores and retries.

use std::sync::Arc;

use serde_json::json;

use contact_gate::adapters::culqi::MockGateway;
use contact_gate::adapters::http::AppState;
use contact_gate::adapters::memory::InMemoryStore;
use contact_gate::application::handlers::{ReconcileWebhookCommand, ReconcileWebhookHandler};
use contact_gate::domain::foundation::{Timestamp, UserId};
use contact_gate::domain::subscription::{User, WebhookError};
use contact_gate::ports::{EventStatus, WebhookEventRepository, WebhookResult};

fn setup() -> (InMemoryStore, ReconcileWebhookHandler) {
    let store = InMemoryStore::new();
    let state = AppState::in_memory(store.clone(), Arc::new(MockGateway::new()));
    (store, state.webhook_handler())
}

fn delivery(body: serde_json::Value) -> ReconcileWebhookCommand {
    ReconcileWebhookCommand {
        payload: serde_json::to_vec(&body).unwrap(),
    }
}

fn renewal(id: &str, user: &str) -> ReconcileWebhookCommand {
    delivery(json!({
        "id": id,
        "type": "subscription.charge.succeeded",
        "data": {"object": {"metadata": {"userId": user}}}
    }))
}

async fn add_user(store: &InMemoryStore, id: &str) {
    store
        .insert_user(User::new(UserId::new(id).unwrap(), format!("{id}@example.com")))
        .await;
}

#[tokio::test]
async fn redelivered_renewal_applies_once() {
    let (store, handler) = setup();
    add_user(&store, "u1").await;

    assert_eq!(handler.handle(renewal("evt_100", "u1")).await.unwrap(), WebhookResult::Processed);
    let expiry = store.user(&UserId::new("u1").unwrap()).await.unwrap().premium_expires_at;
    for _ in 0..3 {
        assert_eq!(
            handler.handle(renewal("evt_100", "u1")).await.unwrap(),
            WebhookResult::AlreadyProcessed
        );
    }

    let user = store.user(&UserId::new("u1").unwrap()).await.unwrap();
    assert_eq!(user.premium_expires_at, expiry);
    let record = store.find_by_key("evt_100").await.unwrap().unwrap();
    assert_eq!(record.status, EventStatus::Succeeded);
}

#[tokio::test]
async fn renewal_without_user_metadata_is_acknowledged() {
    let (store, handler) = setup();
    add_user(&store, "u1").await;

    let result = handler
        .handle(delivery(json!({
            "id": "evt_200",
            "type": "subscription.charge.succeeded",
            "data": {"object": {"metadata": {}}}
        })))
        .await
        .unwrap();

    assert_eq!(result, WebhookResult::Ignored);
    let record = store.find_by_key("evt_200").await.unwrap().unwrap();
    assert_eq!(record.status, EventStatus::Ignored);
    assert!(record.detail.is_some());
    let user = store.user(&UserId::new("u1").unwrap()).await.unwrap();
    assert!(!user.effective_premium_at(Timestamp::now()));
}

#[tokio::test]
async fn events_without_id_dedupe_on_content() {
    let (store, handler) = setup();
    add_user(&store, "u1").await;
    let body = json!({
        "type": "subscription.charge.succeeded",
        "data": {"object": {"metadata": {"userId": "u1"}}}
    });

    let first = handler.handle(delivery(body.clone())).await.unwrap();
    let second = handler.handle(delivery(body)).await.unwrap();

    assert_eq!(first, WebhookResult::Processed);
    assert_eq!(second, WebhookResult::AlreadyProcessed);
}

#[tokio::test]
async fn malformed_body_is_rejected_without_a_claim() {
    let (store, handler) = setup();

    let err = handler
        .handle(ReconcileWebhookCommand {
            payload: b"{\"id\": ".to_vec(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, WebhookError::ParseError(_)));
    assert!(!err.is_retryable());
    assert_eq!(store.delete_before(Timestamp::now().add_days(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn renewal_for_unknown_user_succeeds_on_redelivery() {
    let (store, handler) = setup();

    let err = handler.handle(renewal("evt_300", "late-user")).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(store.find_by_key("evt_300").await.unwrap().is_none());

    add_user(&store, "late-user").await;
    let result = handler.handle(renewal("evt_300", "late-user")).await.unwrap();

    assert_eq!(result, WebhookResult::Processed);
    let user = store.user(&UserId::new("late-user").unwrap()).await.unwrap();
    assert!(user.effective_premium_at(Timestamp::now()));
}

#[tokio::test]
async fn old_events_are_purged() {
    let (store, handler) = setup();
    handler
        .handle(delivery(json!({"id": "evt_400", "type": "charge.creation.succeeded"})))
        .await
        .unwrap();

    assert_eq!(store.delete_before(Timestamp::now().minus_days(1)).await.unwrap(), 0);
    assert_eq!(store.delete_before(Timestamp::now().add_days(1)).await.unwrap(), 1);
    assert!(store.find_by_key("evt_400").await.unwrap().is_none());
}
