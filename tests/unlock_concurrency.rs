//! Concurrent unlocks for the same (user, agent) pair.
//!
//! Every request races through the full handler. Exactly one reaches the
//! gateway and writes a grant; the rest see `AlreadyGranted` and are never
//! charged.

use std::sync::Arc;
use std::time::Duration;

use contact_gate::adapters::culqi::{MockGateway, MockResponse};
use contact_gate::adapters::http::AppState;
use contact_gate::adapters::memory::InMemoryStore;
use contact_gate::application::handlers::UnlockContactCommand;
use contact_gate::domain::access::{Agent, AgentRole};
use contact_gate::domain::foundation::{AgentId, UserId};
use contact_gate::domain::payment::{LedgerStatus, TransactionError};
use contact_gate::domain::subscription::User;

const RACERS: usize = 8;

async fn seeded_state(gateway: &MockGateway) -> (InMemoryStore, AppState) {
    let store = InMemoryStore::new();
    store
        .insert_agent(
            Agent::new(AgentId::new("agent-1").unwrap(), AgentRole::Guide, "Rosa")
                .with_access_price(15.0)
                .unwrap()
                .with_contact("instagram", "@rosa.guia"),
        )
        .await;
    for user in ["user-1", "user-2"] {
        store
            .insert_user(User::new(UserId::new(user).unwrap(), format!("{user}@example.com")))
            .await;
    }
    let state = AppState::in_memory(store.clone(), Arc::new(gateway.clone()));
    (store, state)
}

fn unlock(user: &str) -> UnlockContactCommand {
    UnlockContactCommand {
        agent_id: "agent-1".to_string(),
        user_id: user.to_string(),
        payment_source_token: "tkn_test_visa".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unlocks_charge_once() {
    let gateway = MockGateway::new();
    // Keeps the winner inside the unit long enough for everyone to queue.
    gateway.set_delay(Duration::from_millis(50));
    let (store, state) = seeded_state(&gateway).await;
    let handler = Arc::new(state.unlock_handler());

    let tasks: Vec<_> = (0..RACERS)
        .map(|_| {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { handler.handle(unlock("user-1")).await })
        })
        .collect();
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| matches!(r, Err(TransactionError::AlreadyGranted { .. })))
        .count();
    assert_eq!(granted, 1);
    assert_eq!(already, RACERS - 1);

    assert_eq!(gateway.call_count(), 1);
    assert_eq!(store.grants().await.len(), 1);
    let entries = store.ledger_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, LedgerStatus::Approved);
    assert_eq!(entries[0].amount.minor_units(), 1500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_users_unlock_independently() {
    let gateway = MockGateway::new();
    gateway.set_delay(Duration::from_millis(20));
    let (store, state) = seeded_state(&gateway).await;
    let handler = Arc::new(state.unlock_handler());

    let first = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { handler.handle(unlock("user-1")).await })
    };
    let second = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { handler.handle(unlock("user-2")).await })
    };

    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());
    assert_eq!(gateway.call_count(), 2);
    assert_eq!(store.grants().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn declined_unlock_can_be_retried() {
    let gateway = MockGateway::declining();
    let (store, state) = seeded_state(&gateway).await;
    let handler = state.unlock_handler();

    let declined = handler.handle(unlock("user-1")).await.unwrap_err();
    assert!(declined.is_payment_declined());
    assert!(store.grants().await.is_empty());

    gateway.set_default(MockResponse::Approve);
    let result = handler.handle(unlock("user-1")).await.unwrap();

    assert!(result.granted);
    let statuses: Vec<_> = store.ledger_entries().await.iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![LedgerStatus::Rejected, LedgerStatus::Approved]);
}
