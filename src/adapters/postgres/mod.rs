//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresUnlockStore` - advisory-locked unlock unit (ledger entry + grant)
//! - `PostgresLedger` - ledger entries with compare-and-set settlement
//! - `PostgresAccessGrants` - grant reads and per-agent counts
//! - `PostgresUserRepository` / `PostgresProductCatalog` - external records
//! - `PostgresWebhookEvents` - webhook claim table

mod access_grants;
mod ledger;
mod products;
mod rows;
mod unlock_store;
mod users;
mod webhook_events;

pub use access_grants::PostgresAccessGrants;
pub use ledger::PostgresLedger;
pub use products::PostgresProductCatalog;
pub use unlock_store::PostgresUnlockStore;
pub use users::PostgresUserRepository;
pub use webhook_events::PostgresWebhookEvents;
