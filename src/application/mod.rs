//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Writes (unlock, charge, webhook) and reads (access, stats, history) get
//! separate handlers.

pub mod charging;
pub mod handlers;

pub use charging::ChargeSettings;
pub use handlers::{
    // Access
    AccessBasis, AccessView, AgentStats, AgentStatsHandler, CheckAccessHandler, CheckAccessQuery,
    UnlockContactCommand, UnlockContactHandler, UnlockContactResult,
    // Payment
    ChargePaymentCommand, ChargePaymentHandler, ChargePaymentResult, ListPaymentsHandler,
    // Subscription
    ExtendSubscriptionHandler, ReconcileWebhookCommand, ReconcileWebhookHandler,
};
