//! HTTP handlers for the unlock, payment and webhook endpoints.
//!
//! These handlers connect Axum routes to the application layer handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::adapters::memory::InMemoryStore;
use crate::application::handlers::{
    AgentStatsHandler, ChargePaymentCommand, ChargePaymentHandler, CheckAccessHandler,
    CheckAccessQuery, ExtendSubscriptionHandler, ListPaymentsHandler, ReconcileWebhookCommand,
    ReconcileWebhookHandler, UnlockContactCommand, UnlockContactHandler,
};
use crate::application::ChargeSettings;
use crate::domain::payment::{AmountPolicy, TransactionError};
use crate::domain::subscription::SubscriptionPolicy;
use crate::ports::{
    AccessGrantStore, PaymentGateway, ProductCatalog, TransactionLedger, UnlockStore,
    UserRepository, WebhookEventRepository, WebhookResult,
};

use super::dto::{
    AccessQuery, AccessResponse, ChargeRequest, ChargeResponse, ErrorResponse,
    LedgerEntryResponse, StatsResponse, UnlockRequest, UnlockResponse, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state: ports plus the settings the handlers are built with.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub unlock_store: Arc<dyn UnlockStore>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub grants: Arc<dyn AccessGrantStore>,
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductCatalog>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub charge_settings: ChargeSettings,
    pub amount_policy: AmountPolicy,
    pub subscription_policy: SubscriptionPolicy,
}

impl AppState {
    /// State over the given ports with default settings.
    pub fn new(
        unlock_store: Arc<dyn UnlockStore>,
        ledger: Arc<dyn TransactionLedger>,
        grants: Arc<dyn AccessGrantStore>,
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductCatalog>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            unlock_store,
            ledger,
            grants,
            users,
            products,
            webhook_events,
            gateway,
            charge_settings: ChargeSettings::default(),
            amount_policy: AmountPolicy::default(),
            subscription_policy: SubscriptionPolicy::default(),
        }
    }

    /// Every storage port backed by one in-memory store.
    pub fn in_memory(store: InMemoryStore, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            gateway,
        )
    }

    pub fn unlock_handler(&self) -> UnlockContactHandler {
        UnlockContactHandler::new(
            self.unlock_store.clone(),
            self.users.clone(),
            self.gateway.clone(),
            self.charge_settings.clone(),
        )
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.unlock_store.clone(), self.grants.clone(), self.users.clone())
    }

    pub fn stats_handler(&self) -> AgentStatsHandler {
        AgentStatsHandler::new(
            self.unlock_store.clone(),
            self.grants.clone(),
            self.charge_settings.default_access_price,
        )
    }

    fn extend_handler(&self) -> ExtendSubscriptionHandler {
        ExtendSubscriptionHandler::new(self.users.clone(), self.subscription_policy)
    }

    pub fn charge_handler(&self) -> ChargePaymentHandler {
        ChargePaymentHandler::new(
            self.ledger.clone(),
            self.users.clone(),
            self.unlock_store.clone(),
            self.products.clone(),
            self.gateway.clone(),
            self.extend_handler(),
            self.amount_policy,
            self.charge_settings.clone(),
        )
    }

    pub fn list_payments_handler(&self) -> ListPaymentsHandler {
        ListPaymentsHandler::new(self.ledger.clone(), self.users.clone())
    }

    pub fn webhook_handler(&self) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(self.webhook_events.clone(), self.extend_handler())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Collaborator endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/collaborators/:agent_id/unlock - Pay to unlock contact networks
pub async fn unlock_contact(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<UnlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = UnlockContactCommand {
        agent_id,
        user_id: request.user_id,
        payment_source_token: request.payment_source_token,
    };
    let result = state.unlock_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(UnlockResponse::from(result))))
}

/// GET /api/collaborators/:agent_id/access?userId= - Contact networks if visible
pub async fn check_access(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            agent_id,
            user_id: query.user_id,
        })
        .await?;
    Ok(Json(AccessResponse::from(view)))
}

/// GET /api/collaborators/:agent_id/stats - Unlock count and revenue
pub async fn agent_stats(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.stats_handler().handle(&agent_id).await?;
    Ok(Json(StatsResponse::from(stats)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/charge - Direct charge (subscription, product, one-off)
pub async fn charge_payment(
    State(state): State<AppState>,
    Json(request): Json<ChargeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ChargePaymentCommand {
        user_id: request.user_id,
        email: request.email,
        payment_kind: request.payment_kind,
        source_token: request.source_token,
        agent_id: request.agent_id,
        product_id: request.product_id,
        save_card: request.save_card,
    };
    let result = state.charge_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(ChargeResponse::from(result))))
}

/// GET /api/users/:user_id/payments - Charge history, newest first
pub async fn list_payments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.list_payments_handler().handle(&user_id).await?;
    let body: Vec<LedgerEntryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/webhooks/culqi - Gateway notifications
///
/// Always answers with a generic body; the status code alone tells the
/// gateway whether to redeliver.
pub async fn culqi_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let cmd = ReconcileWebhookCommand {
        payload: body.to_vec(),
    };
    match state.webhook_handler().handle(cmd).await {
        Ok(result) => {
            if result == WebhookResult::AlreadyProcessed {
                tracing::debug!("Duplicate webhook acknowledged");
            }
            (StatusCode::OK, Json(WebhookAck::ok())).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, retryable = err.is_retryable(), "Webhook rejected");
            (err.status_code(), Json(WebhookAck::error())).into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts transaction errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(TransactionError);

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TransactionError::AgentNotFound(_) | TransactionError::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            TransactionError::ProductUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TransactionError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            TransactionError::AlreadyGranted { .. } | TransactionError::PersistenceConflict(_) => {
                StatusCode::CONFLICT
            }
            TransactionError::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
            TransactionError::GatewayUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TransactionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            TransactionError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Internal error".to_string()
            }
            other => other.message(),
        };
        let mut body = ErrorResponse::new(self.0.code().to_string(), message);
        if let Some(ledger_id) = self.0.ledger_id() {
            body = body.with_ledger_id(ledger_id.to_string());
        }
        (status, Json(body)).into_response()
    }
}
