//! Subscription period rules.

use crate::domain::foundation::Timestamp;

use super::User;

/// Length of a premium period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPolicy {
    period_days: i64,
}

impl SubscriptionPolicy {
    pub const DEFAULT_PERIOD_DAYS: i64 = 30;

    pub fn new(period_days: i64) -> Self {
        Self { period_days }
    }

    pub fn period_days(&self) -> i64 {
        self.period_days
    }

    /// Expiration of a period starting at `now`.
    pub fn period_end(&self, now: Timestamp) -> Timestamp {
        now.add_days(self.period_days)
    }

    /// Applies one period to the user, measured from `now` rather than the
    /// previous expiration. Returns the new expiration.
    pub fn extend(&self, user: &mut User, now: Timestamp) -> Timestamp {
        let until = self.period_end(now);
        user.extend_premium_until(until);
        until
    }
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD_DAYS)
    }
}
