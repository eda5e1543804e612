//! PostgreSQL implementation of WebhookEventRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{ClaimResult, EventStatus, WebhookEventRecord, WebhookEventRepository};

use super::rows::db_error;

pub struct PostgresWebhookEvents {
    pool: PgPool,
}

impl PostgresWebhookEvents {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_key: String,
    event_type: String,
    status: String,
    detail: Option<String>,
    payload: serde_json::Value,
    received_at: DateTime<Utc>,
    claimed_at: DateTime<Utc>,
}

fn parse_status(raw: &str) -> Result<EventStatus, DomainError> {
    EventStatus::from_storage(raw).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid webhook status value: {}", raw),
        )
    })
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEventRecord {
            status: parse_status(&row.status)?,
            event_key: row.event_key,
            event_type: row.event_type,
            detail: row.detail,
            received_at: Timestamp::from_datetime(row.received_at),
            claimed_at: Timestamp::from_datetime(row.claimed_at),
            payload: row.payload,
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEvents {
    async fn find_by_key(&self, event_key: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_key, event_type, status, detail, payload, received_at, claimed_at
            FROM webhook_events WHERE event_key = $1
            "#,
        )
        .bind(event_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read webhook event", e))?;
        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn claim(
        &self,
        record: WebhookEventRecord,
        stale_before: Timestamp,
    ) -> Result<ClaimResult, DomainError> {
        // Affects one row on a fresh insert or on takeover of an expired claim
        let inserted = sqlx::query(
            r#"
            INSERT INTO webhook_events
                (event_key, event_type, status, detail, payload, received_at, claimed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (event_key) DO UPDATE
                SET claimed_at = EXCLUDED.claimed_at,
                    payload = EXCLUDED.payload,
                    updated_at = now()
                WHERE webhook_events.status = 'processing'
                  AND webhook_events.claimed_at < $8
            "#,
        )
        .bind(&record.event_key)
        .bind(&record.event_type)
        .bind(record.status.as_str())
        .bind(record.detail.as_deref())
        .bind(&record.payload)
        .bind(*record.received_at.as_datetime())
        .bind(*record.claimed_at.as_datetime())
        .bind(*stale_before.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to claim webhook event", e))?;

        if inserted.rows_affected() == 1 {
            return Ok(ClaimResult::Claimed);
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT status FROM webhook_events WHERE event_key = $1")
                .bind(&record.event_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to read webhook event", e))?;
        // Released between the insert and this read: the other delivery is
        // still retrying, so report it as in flight.
        match existing {
            Some((status,)) => Ok(ClaimResult::AlreadyClaimed(parse_status(&status)?)),
            None => Ok(ClaimResult::AlreadyClaimed(EventStatus::Processing)),
        }
    }

    async fn complete(
        &self,
        event_key: &str,
        status: EventStatus,
        detail: Option<String>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE webhook_events SET status = $2, detail = $3, updated_at = now() WHERE event_key = $1",
        )
        .bind(event_key)
        .bind(status.as_str())
        .bind(detail)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to complete webhook event", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::database(format!(
                "webhook event {} was never claimed",
                event_key
            )));
        }
        Ok(())
    }

    async fn release(&self, event_key: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM webhook_events WHERE event_key = $1 AND status = 'processing'")
            .bind(event_key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to release webhook event", e))?;
        Ok(())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE received_at < $1")
            .bind(*timestamp.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete old webhook events", e))?;
        Ok(result.rows_affected())
    }
}
