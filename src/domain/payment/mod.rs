//! Payment domain module.
//!
//! - `kind` - closed set of payment kinds and their wire aliases
//! - `amount_policy` - amount and description per kind
//! - `ledger_entry` - charge attempts and their settlement state machine
//! - `product` - read-only catalog products
//! - `errors` - `TransactionError`

mod amount_policy;
mod errors;
mod kind;
mod ledger_entry;
mod product;

pub use amount_policy::{AmountPolicy, Quote, QuoteRequest};
pub use errors::TransactionError;
pub use kind::PaymentKind;
pub use ledger_entry::{LedgerEntry, LedgerStatus, PaymentTarget};
pub use product::Product;
