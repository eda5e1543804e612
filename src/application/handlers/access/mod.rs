//! Access handlers - unlocks and access queries.

mod agent_stats;
mod check_access;
mod unlock_contact;

pub use agent_stats::{AgentStats, AgentStatsHandler};
pub use check_access::{AccessBasis, AccessView, CheckAccessHandler, CheckAccessQuery};
pub use unlock_contact::{UnlockContactCommand, UnlockContactHandler, UnlockContactResult};
