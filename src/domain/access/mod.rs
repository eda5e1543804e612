//! Access domain module.
//!
//! Gated agents and the grants that unlock their contact networks.

mod agent;
mod grant;

pub use agent::{Agent, AgentRole};
pub use grant::{AccessGrant, AccessType};
