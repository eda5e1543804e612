//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::User;
use crate::ports::UserRepository;

use super::rows::{db_error, UserRow};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, role, is_active, is_premium, premium_expires_at, saved_card_token
            FROM users WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read user", e))?;
        row.map(User::try_from).transpose()
    }

    async fn set_premium_until(&self, user_id: &UserId, until: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE users SET is_premium = TRUE, premium_expires_at = $2 WHERE id = $1",
        )
        .bind(user_id.as_str())
        .bind(*until.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to extend premium", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn save_card_token(&self, user_id: &UserId, token: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE users SET saved_card_token = $2 WHERE id = $1")
            .bind(user_id.as_str())
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to save card token", e))?;
        Ok(result.rows_affected() == 1)
    }
}
