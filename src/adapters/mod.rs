//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `culqi` - Culqi charge API client and a scripted mock gateway
//! - `http` - Axum REST surface
//! - `memory` - In-memory storage for tests and local runs
//! - `postgres` - PostgreSQL storage

pub mod culqi;
pub mod http;
pub mod memory;
pub mod postgres;

pub use culqi::{CulqiConfig, CulqiGateway, MockGateway, MockResponse};
pub use memory::InMemoryStore;
