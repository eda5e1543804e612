//! Subscription handlers.

mod extend_subscription;
mod reconcile_webhook;

pub use extend_subscription::ExtendSubscriptionHandler;
pub use reconcile_webhook::{ReconcileWebhookCommand, ReconcileWebhookHandler};
