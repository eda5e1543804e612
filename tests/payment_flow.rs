//! End-to-end payment flows against the in-memory store and mock gateway.

use std::sync::Arc;

use contact_gate::adapters::culqi::{MockGateway, MockResponse};
use contact_gate::adapters::http::AppState;
use contact_gate::adapters::memory::InMemoryStore;
use contact_gate::application::handlers::{
    AccessBasis, ChargePaymentCommand, CheckAccessQuery, UnlockContactCommand,
};
use contact_gate::domain::access::{Agent, AgentRole};
use contact_gate::domain::foundation::{AgentId, Money, ProductId, Timestamp, UserId};
use contact_gate::domain::payment::{
    LedgerStatus, PaymentKind, PaymentTarget, Product, TransactionError,
};
use contact_gate::domain::subscription::User;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct World {
    store: InMemoryStore,
    gateway: MockGateway,
    state: AppState,
}

async fn world() -> World {
    let store = InMemoryStore::new();
    store
        .insert_agent(
            Agent::new(AgentId::new("guide-1").unwrap(), AgentRole::Guide, "Rosa")
                .with_access_price(15.0)
                .unwrap()
                .with_contact("whatsapp", "+51 984 000 111")
                .with_contact("instagram", "@rosa.guia"),
        )
        .await;
    store
        .insert_agent(Agent::new(AgentId::new("agency-1").unwrap(), AgentRole::Artisan, "Andes Textiles"))
        .await;
    store
        .insert_agent(Agent::new(AgentId::new("traveler-1").unwrap(), AgentRole::Other("TRAVELER".into()), "Leo"))
        .await;
    store
        .insert_product(Product {
            id: ProductId::new("tour-cusco").unwrap(),
            owner_agent_id: AgentId::new("agency-1").unwrap(),
            name: "Cusco city tour".to_string(),
            price: Money::from_major(12.34).unwrap(),
            available: true,
        })
        .await;

    let mut carded = User::new(UserId::new("carded").unwrap(), "carded@example.com");
    carded.save_card_token("crd_live_123");
    store.insert_user(carded).await;
    store
        .insert_user(User::new(UserId::new("buyer").unwrap(), "buyer@example.com"))
        .await;

    let gateway = MockGateway::new();
    let state = AppState::in_memory(store.clone(), Arc::new(gateway.clone()));
    World {
        store,
        gateway,
        state,
    }
}

fn unlock(user: &str, agent: &str) -> UnlockContactCommand {
    UnlockContactCommand {
        agent_id: agent.to_string(),
        user_id: user.to_string(),
        payment_source_token: "tkn_test_visa".to_string(),
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

// =============================================================================
// Unlock
// =============================================================================

#[tokio::test]
async fn unlock_charges_agent_price_and_reveals_contacts() {
    let w = world().await;

    let result = w.state.unlock_handler().handle(unlock("buyer", "guide-1")).await.unwrap();

    assert!(result.granted);
    let calls = w.gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].amount.minor_units(), 1500);
    assert_eq!(calls[0].currency, "PEN");
    assert_eq!(calls[0].email, "buyer@example.com");

    let entries = w.store.ledger_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, result.ledger_id);
    assert_eq!(entries[0].status, LedgerStatus::Approved);
    assert_eq!(entries[0].amount.as_major(), 15.0);

    let view = w
        .state
        .check_access_handler()
        .handle(CheckAccessQuery {
            agent_id: "guide-1".to_string(),
            user_id: Some("buyer".to_string()),
        })
        .await
        .unwrap();
    assert!(view.has_access);
    assert_eq!(view.basis, AccessBasis::Grant);
    let networks = view.contact_networks.unwrap();
    assert_eq!(networks.get("instagram").map(String::as_str), Some("@rosa.guia"));
}

#[tokio::test]
async fn repeat_unlock_is_refused_without_charging() {
    let w = world().await;
    let handler = w.state.unlock_handler();
    handler.handle(unlock("buyer", "guide-1")).await.unwrap();

    let err = handler.handle(unlock("buyer", "guide-1")).await.unwrap_err();

    assert!(matches!(err, TransactionError::AlreadyGranted { .. }));
    assert_eq!(w.gateway.call_count(), 1);
    assert_eq!(w.store.ledger_entries().await.len(), 1);
}

#[tokio::test]
async fn unpriced_agent_uses_default_price() {
    let w = world().await;

    w.state.unlock_handler().handle(unlock("buyer", "agency-1")).await.unwrap();

    assert_eq!(w.gateway.calls()[0].amount.minor_units(), 1000);
}

#[tokio::test]
async fn ungated_role_cannot_be_unlocked() {
    let w = world().await;

    let err = w
        .state
        .unlock_handler()
        .handle(unlock("buyer", "traveler-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransactionError::AgentNotFound(_)));
    assert_eq!(w.gateway.call_count(), 0);
}

#[tokio::test]
async fn failed_commit_leaves_no_trace() {
    let w = world().await;
    w.store.fail_next_commit();

    let err = w.state.unlock_handler().handle(unlock("buyer", "guide-1")).await.unwrap_err();

    assert!(matches!(err, TransactionError::Infrastructure(_)));
    assert_eq!(w.gateway.call_count(), 1);
    assert!(w.store.ledger_entries().await.is_empty());
    assert!(w.store.grants().await.is_empty());
}

#[tokio::test]
async fn stats_count_grants_at_current_price() {
    let w = world().await;
    let handler = w.state.unlock_handler();
    handler.handle(unlock("buyer", "guide-1")).await.unwrap();
    handler.handle(unlock("carded", "guide-1")).await.unwrap();

    let stats = w.state.stats_handler().handle("guide-1").await.unwrap();

    assert_eq!(stats.total_accesses, 2);
    assert_eq!(stats.revenue.minor_units(), 3000);
}

// =============================================================================
// Direct charges
// =============================================================================

#[tokio::test]
async fn product_charge_credits_owner() {
    let w = world().await;

    let result = w
        .state
        .charge_handler()
        .handle(ChargePaymentCommand {
            user_id: "buyer".to_string(),
            payment_kind: Some("PRODUCT".to_string()),
            product_id: Some("tour-cusco".to_string()),
            source_token: Some("tkn_test_visa".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(result.entry.kind, PaymentKind::Product);
    assert_eq!(result.entry.amount.minor_units(), 1234);
    assert_eq!(
        result.entry.target,
        PaymentTarget::Product {
            product_id: ProductId::new("tour-cusco").unwrap(),
            owner_agent_id: AgentId::new("agency-1").unwrap(),
        }
    );
    assert!(result.premium_until.is_none());
}

#[tokio::test]
async fn subscription_charge_makes_user_premium() {
    let w = world().await;

    let result = w
        .state
        .charge_handler()
        .handle(ChargePaymentCommand {
            user_id: "buyer".to_string(),
            payment_kind: Some("MENSUAL".to_string()),
            source_token: Some("tkn_test_visa".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let until = result.premium_until.unwrap();
    assert!(until.is_after(&Timestamp::now().add_days(29)));
    let buyer = w.store.user(&user("buyer")).await.unwrap();
    assert!(buyer.effective_premium_at(Timestamp::now()));

    // Premium users see every gated agent without a grant.
    let view = w
        .state
        .check_access_handler()
        .handle(CheckAccessQuery {
            agent_id: "agency-1".to_string(),
            user_id: Some("buyer".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(view.basis, AccessBasis::Premium);
}

#[tokio::test]
async fn one_click_uses_saved_card() {
    let w = world().await;

    w.state
        .charge_handler()
        .handle(ChargePaymentCommand {
            user_id: "carded".to_string(),
            payment_kind: Some("ONE_CLICK".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(w.gateway.calls()[0].source_token, "crd_live_123");
}

#[tokio::test]
async fn save_card_stores_token_for_next_time() {
    let w = world().await;
    let handler = w.state.charge_handler();

    handler
        .handle(ChargePaymentCommand {
            user_id: "buyer".to_string(),
            source_token: Some("crd_new_456".to_string()),
            save_card: true,
            ..Default::default()
        })
        .await
        .unwrap();
    handler
        .handle(ChargePaymentCommand {
            user_id: "buyer".to_string(),
            payment_kind: Some("ONE_CLICK".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let calls = w.gateway.calls();
    assert_eq!(calls[1].source_token, "crd_new_456");
}

#[tokio::test]
async fn declined_subscription_is_recorded_but_not_applied() {
    let w = world().await;
    w.gateway.push(MockResponse::Decline("tarjeta_rechazada".to_string()));

    let err = w
        .state
        .charge_handler()
        .handle(ChargePaymentCommand {
            user_id: "buyer".to_string(),
            payment_kind: Some("SUBSCRIPTION".to_string()),
            source_token: Some("tkn_test_visa".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    let ledger_id = err.ledger_id().cloned().unwrap();
    let history = w.state.list_payments_handler().handle("buyer").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, ledger_id);
    assert_eq!(history[0].status, LedgerStatus::Rejected);
    let buyer = w.store.user(&user("buyer")).await.unwrap();
    assert!(!buyer.effective_premium_at(Timestamp::now()));
}

#[tokio::test]
async fn history_is_newest_first() {
    let w = world().await;
    let handler = w.state.charge_handler();
    for kind in ["ONE_TIME", "MENSUAL"] {
        handler
            .handle(ChargePaymentCommand {
                user_id: "buyer".to_string(),
                payment_kind: Some(kind.to_string()),
                source_token: Some("tkn_test_visa".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let history = w.state.list_payments_handler().handle("buyer").await.unwrap();

    let kinds: Vec<_> = history.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![PaymentKind::Subscription, PaymentKind::OneTime]);
}
