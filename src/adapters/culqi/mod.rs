//! Culqi adapters - implementations of the payment gateway port.
//!
//! - `CulqiGateway` - REST client for the Culqi charge API
//! - `MockGateway` - scripted gateway for tests and local runs

mod charge_types;
mod culqi_gateway;
mod mock_gateway;

pub use culqi_gateway::{CulqiConfig, CulqiGateway};
pub use mock_gateway::{MockGateway, MockResponse};
