//! HTTP adapter - thin REST surface over the application handlers.
//!
//! - `POST /api/collaborators/:agent_id/unlock` - Pay to unlock contact networks
//! - `GET /api/collaborators/:agent_id/access` - Access check
//! - `GET /api/collaborators/:agent_id/stats` - Unlock count and revenue
//! - `POST /api/payments/charge` - Direct charge
//! - `GET /api/users/:user_id/payments` - Charge history
//! - `POST /api/webhooks/culqi` - Gateway notifications

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::{api_router, app};
