//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `PaymentGateway` - External card processor
//! - `UnlockStore` / `UnlockTransaction` - Atomic ledger + grant unit per pair
//! - `TransactionLedger` - Charge attempts outside the unlock flow
//!
//! ## Read Ports
//!
//! - `AccessGrantStore`, `UserRepository`, `ProductCatalog`
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - Gateway notification deduplication

mod access_grant_store;
mod payment_gateway;
mod product_catalog;
mod transaction_ledger;
mod unlock_store;
mod user_repository;
mod webhook_event_repository;

pub use access_grant_store::AccessGrantStore;
pub use payment_gateway::{
    ChargeOutcome, ChargeRequest, ChargeResult, GatewayError, GatewayErrorCode, PaymentGateway,
};
pub use product_catalog::ProductCatalog;
pub use transaction_ledger::TransactionLedger;
pub use unlock_store::{UnlockOutcome, UnlockStore, UnlockTransaction};
pub use user_repository::UserRepository;
pub use webhook_event_repository::{
    ClaimResult, EventStatus, WebhookEventRecord, WebhookEventRepository, WebhookResult,
};
