//! Contact Gate - Paid contact unlocks and premium subscriptions
//!
//! Marketplace users pay to see an agent's contact networks, buy catalog
//! products, or subscribe for premium access. Each unlock writes its ledger
//! entry and access grant in one atomic unit per (user, agent) pair, and
//! gateway webhooks are applied exactly once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
