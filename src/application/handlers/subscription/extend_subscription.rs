//! ExtendSubscriptionHandler - Start a new premium period for a user.
//!
//! Shared by the synchronous charge flow and the webhook reconciler so both
//! apply the exact same rule.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::payment::TransactionError;
use crate::domain::subscription::SubscriptionPolicy;
use crate::ports::UserRepository;

#[derive(Clone)]
pub struct ExtendSubscriptionHandler {
    users: Arc<dyn UserRepository>,
    policy: SubscriptionPolicy,
}

impl ExtendSubscriptionHandler {
    pub fn new(users: Arc<dyn UserRepository>, policy: SubscriptionPolicy) -> Self {
        Self { users, policy }
    }

    /// Sets the user's expiration to `now + period`, whatever it was before.
    ///
    /// Returns the new expiration.
    pub async fn handle(&self, user_id: &UserId) -> Result<Timestamp, TransactionError> {
        let until = self.policy.period_end(Timestamp::now());
        let found = self.users.set_premium_until(user_id, until).await?;
        if !found {
            return Err(TransactionError::user_not_found(user_id.clone()));
        }
        tracing::info!(user_id = %user_id, premium_until = %until, "Subscription extended");
        Ok(until)
    }
}
