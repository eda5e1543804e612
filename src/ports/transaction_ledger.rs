//! Transaction ledger port - append-only record of charge attempts.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LedgerEntryId, UserId};
use crate::domain::payment::LedgerEntry;

#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Writes a new entry.
    ///
    /// # Errors
    ///
    /// `PersistenceConflict` if an entry with the same id exists.
    async fn record(&self, entry: &LedgerEntry) -> Result<(), DomainError>;

    /// Stores the terminal state of an entry that is still `Pending`.
    ///
    /// # Errors
    ///
    /// - `LedgerEntryNotFound` if the id is unknown
    /// - `PersistenceConflict` if the stored entry is already settled
    async fn settle(&self, entry: &LedgerEntry) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &LedgerEntryId) -> Result<Option<LedgerEntry>, DomainError>;

    /// Entries of one user, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, DomainError>;
}
