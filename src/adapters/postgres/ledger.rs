//! PostgreSQL implementation of TransactionLedger.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, LedgerEntryId, UserId};
use crate::domain::payment::LedgerEntry;
use crate::ports::TransactionLedger;

use super::rows::{bind_ledger_insert, db_error, LedgerRow, LEDGER_COLUMNS};

pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLedger for PostgresLedger {
    async fn record(&self, entry: &LedgerEntry) -> Result<(), DomainError> {
        bind_ledger_insert(entry)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DomainError::conflict(format!("ledger entry {} already exists", entry.id))
                }
                _ => db_error("Failed to record ledger entry", e),
            })?;
        Ok(())
    }

    /// Compare-and-set on `status = 'pending'`; a second settle loses.
    async fn settle(&self, entry: &LedgerEntry) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_entries SET
                status = $2,
                gateway_charge_id = $3,
                decline_reason = $4,
                settled_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(entry.id.as_str())
        .bind(entry.status.as_str())
        .bind(entry.gateway_charge_id.as_deref())
        .bind(entry.decline_reason.as_deref())
        .bind(entry.settled_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to settle ledger entry", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let current: Option<(String,)> = sqlx::query_as("SELECT status FROM ledger_entries WHERE id = $1")
            .bind(entry.id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read ledger entry", e))?;
        match current {
            None => Err(DomainError::new(
                ErrorCode::LedgerEntryNotFound,
                format!("ledger entry {} not found", entry.id),
            )),
            Some((status,)) => Err(DomainError::conflict(format!(
                "ledger entry {} is already {}",
                entry.id, status
            ))),
        }
    }

    async fn find_by_id(&self, id: &LedgerEntryId) -> Result<Option<LedgerEntry>, DomainError> {
        let row: Option<LedgerRow> =
            sqlx::query_as(&format!("SELECT {} FROM ledger_entries WHERE id = $1", LEDGER_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to read ledger entry", e))?;
        row.map(LedgerEntry::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, DomainError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ledger_entries WHERE user_id = $1 ORDER BY created_at DESC",
            LEDGER_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list ledger entries", e))?;
        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}
