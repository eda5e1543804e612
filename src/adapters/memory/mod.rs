//! In-memory adapters for tests and local runs.
//!
//! - `InMemoryStore` - every storage port over one shared document map

mod repositories;
mod store;
mod unlock_store;

pub use store::InMemoryStore;
