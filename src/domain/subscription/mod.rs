//! Subscription domain module.
//!
//! Premium status derived at read time from a stored expiration, the rule
//! for extending it, and the gateway notifications that trigger extensions.

mod gateway_event;
mod policy;
mod user;
mod webhook_errors;

pub use gateway_event::{EventAction, GatewayEvent};
pub use policy::SubscriptionPolicy;
pub use user::User;
pub use webhook_errors::WebhookError;
