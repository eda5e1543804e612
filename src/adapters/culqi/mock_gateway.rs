//! Mock payment gateway for testing.
//!
//! Supports:
//! - Scripted responses, consumed in order, then a default
//! - Artificial latency (for timeout and concurrency tests)
//! - Call tracking

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{ChargeOutcome, ChargeRequest, ChargeResult, GatewayError, PaymentGateway};

/// How the mock answers one charge.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// `outcome.type = venta_exitosa`.
    Approve,
    /// Charge created with the given non-success `outcome.type`.
    Decline(String),
    Fail(GatewayError),
}

#[derive(Default)]
struct MockState {
    script: VecDeque<MockResponse>,
    default: Option<MockResponse>,
    delay: Option<Duration>,
    calls: Vec<ChargeRequest>,
}

/// Mock gateway.
///
/// ```ignore
/// let gateway = MockGateway::new();
/// gateway.push(MockResponse::Decline("tarjeta_rechazada".into()));
/// // first charge is declined, later ones approved
/// ```
#[derive(Clone, Default)]
pub struct MockGateway {
    inner: Arc<Mutex<MockState>>,
    next_id: Arc<AtomicU64>,
}

impl MockGateway {
    /// Approves every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declines every charge.
    pub fn declining() -> Self {
        let mock = Self::new();
        mock.set_default(MockResponse::Decline("tarjeta_rechazada".to_string()));
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Queues a response for the next unscripted call.
    pub fn push(&self, response: MockResponse) {
        self.state().script.push_back(response);
    }

    /// Response used once the script is exhausted.
    pub fn set_default(&self, response: MockResponse) {
        self.state().default = Some(response);
    }

    /// Sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<ChargeRequest> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, GatewayError> {
        let (response, delay) = {
            let mut state = self.state();
            state.calls.push(request);
            let response = state
                .script
                .pop_front()
                .or_else(|| state.default.clone())
                .unwrap_or(MockResponse::Approve);
            (response, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let charge_id = format!("chr_mock_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        match response {
            MockResponse::Approve => Ok(ChargeResult {
                gateway_charge_id: charge_id,
                outcome: ChargeOutcome::Approved,
                outcome_type: "venta_exitosa".to_string(),
            }),
            MockResponse::Decline(outcome_type) => Ok(ChargeResult {
                gateway_charge_id: charge_id,
                outcome: ChargeOutcome::from_outcome_type(&outcome_type),
                outcome_type,
            }),
            MockResponse::Fail(err) => Err(err),
        }
    }
}
