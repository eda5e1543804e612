//! Axum router configuration.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    agent_stats, charge_payment, check_access, culqi_webhook, list_payments, unlock_contact,
    AppState,
};

/// Create the API router.
///
/// # Routes
///
/// - `POST /api/collaborators/:agent_id/unlock` - Pay to unlock contact networks
/// - `GET /api/collaborators/:agent_id/access` - Access check (`?userId=`)
/// - `GET /api/collaborators/:agent_id/stats` - Unlock count and revenue
/// - `POST /api/payments/charge` - Direct charge
/// - `GET /api/users/:user_id/payments` - Charge history
/// - `POST /api/webhooks/culqi` - Gateway notifications
pub fn api_router() -> Router<AppState> {
    let collaborators = Router::new()
        .route("/:agent_id/unlock", post(unlock_contact))
        .route("/:agent_id/access", get(check_access))
        .route("/:agent_id/stats", get(agent_stats));

    Router::new()
        .nest("/api/collaborators", collaborators)
        .route("/api/payments/charge", post(charge_payment))
        .route("/api/users/:user_id/payments", get(list_payments))
        .route("/api/webhooks/culqi", post(culqi_webhook))
}

/// Router with state and middleware applied.
///
/// Every request gets an `x-request-id` (kept if the caller sent one) that is
/// echoed on the response.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(request_timeout));

    api_router().layer(middleware).with_state(state)
}
