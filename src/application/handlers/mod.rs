//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations through ports.

pub mod access;
pub mod payment;
pub mod subscription;

pub use access::{
    AccessBasis, AccessView, AgentStats, AgentStatsHandler, CheckAccessHandler, CheckAccessQuery,
    UnlockContactCommand, UnlockContactHandler, UnlockContactResult,
};
pub use payment::{ChargePaymentCommand, ChargePaymentHandler, ChargePaymentResult, ListPaymentsHandler};
pub use subscription::{ExtendSubscriptionHandler, ReconcileWebhookCommand, ReconcileWebhookHandler};
