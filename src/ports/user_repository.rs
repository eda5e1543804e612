//! User repository port.
//!
//! Users are created elsewhere; this service only reads them and applies
//! single-field updates, each atomic on its own.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the stored user, premium flag as stored.
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, DomainError>;

    /// Sets `is_premium = true` and `premium_expires_at = until`.
    ///
    /// Returns `false` if the user does not exist.
    async fn set_premium_until(&self, user_id: &UserId, until: Timestamp) -> Result<bool, DomainError>;

    /// Stores the card token used by one-click charges.
    ///
    /// Returns `false` if the user does not exist.
    async fn save_card_token(&self, user_id: &UserId, token: &str) -> Result<bool, DomainError>;
}
