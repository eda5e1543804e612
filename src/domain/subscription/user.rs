//! Paying users and their premium status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// A user as seen by the payment flows.
///
/// `is_premium` is stored and may be stale; read it through
/// [`User::effective_premium_at`], never directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_premium: bool,
    pub premium_expires_at: Option<Timestamp>,
    /// Gateway card id reused by one-click charges.
    pub saved_card_token: Option<String>,
}

impl User {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: "USER".to_string(),
            is_active: true,
            is_premium: false,
            premium_expires_at: None,
            saved_card_token: None,
        }
    }

    /// Premium status reconciled against the expiration timestamp.
    ///
    /// A premium flag without an expiration never lapses.
    pub fn effective_premium_at(&self, now: Timestamp) -> bool {
        self.is_premium
            && self
                .premium_expires_at
                .map_or(true, |expires| expires.is_after(&now))
    }

    /// Returns a copy whose stored flag matches [`User::effective_premium_at`].
    pub fn normalized_at(mut self, now: Timestamp) -> Self {
        self.is_premium = self.effective_premium_at(now);
        self
    }

    /// Restarts the premium window at `until`, forfeiting any remaining days.
    pub fn extend_premium_until(&mut self, until: Timestamp) {
        self.is_premium = true;
        self.premium_expires_at = Some(until);
    }

    pub fn save_card_token(&mut self, token: impl Into<String>) {
        self.saved_card_token = Some(token.into());
    }
}
