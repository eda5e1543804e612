//! Marketplace agents whose contact networks can be unlocked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{AgentId, Money, ValidationError};

/// Role of a marketplace participant.
///
/// Storage may hold roles this service does not know about; they are kept
/// verbatim so that reading an agent never fails on an unexpected role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentRole {
    Guide,
    Artisan,
    Other(String),
}

impl AgentRole {
    /// Only guides and artisans can be gated, charged for, or commented on.
    pub fn is_gated(&self) -> bool {
        matches!(self, AgentRole::Guide | AgentRole::Artisan)
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentRole::Guide => "GUIDE",
            AgentRole::Artisan => "ARTISAN",
            AgentRole::Other(raw) => raw,
        }
    }
}

impl From<String> for AgentRole {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GUIDE" => AgentRole::Guide,
            "ARTISAN" => AgentRole::Artisan,
            _ => AgentRole::Other(raw),
        }
    }
}

impl From<AgentRole> for String {
    fn from(role: AgentRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marketplace agent (collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub role: AgentRole,
    pub display_name: String,

    /// Price of unlocking the contact networks; `None` falls back to the
    /// configured default.
    pub access_price: Option<Money>,

    /// Gated contact handles keyed by network name.
    pub contact_networks: BTreeMap<String, String>,
}

impl Agent {
    pub fn new(id: AgentId, role: AgentRole, display_name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            display_name: display_name.into(),
            access_price: None,
            contact_networks: BTreeMap::new(),
        }
    }

    /// Sets the access price from a major-unit amount.
    pub fn with_access_price(mut self, major: f64) -> Result<Self, ValidationError> {
        self.access_price = Some(Money::from_major(major)?);
        Ok(self)
    }

    pub fn with_contact(mut self, network: impl Into<String>, handle: impl Into<String>) -> Self {
        self.contact_networks.insert(network.into(), handle.into());
        self
    }

    pub fn is_gated(&self) -> bool {
        self.role.is_gated()
    }

    /// Price charged for an unlock, using `default` when none is stored.
    pub fn price_or(&self, default: Money) -> Money {
        self.access_price.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(role: &str) -> Agent {
        Agent::new(AgentId::new("agent-1").unwrap(), AgentRole::from(role.to_string()), "Rosa")
    }

    #[test]
    fn guide_and_artisan_are_gated() {
        assert!(agent("GUIDE").is_gated());
        assert!(agent("artisan").is_gated());
    }

    #[test]
    fn unknown_roles_are_not_gated_and_round_trip() {
        let a = agent("AGENTE_CULTURAL");
        assert!(!a.is_gated());
        assert_eq!(a.role.as_str(), "AGENTE_CULTURAL");
    }

    #[test]
    fn price_falls_back_to_default() {
        let default = Money::from_major(10.0).unwrap();
        assert_eq!(agent("GUIDE").price_or(default), default);

        let priced = agent("GUIDE").with_access_price(15.0).unwrap();
        assert_eq!(priced.price_or(default).minor_units(), 1500);
    }

    #[test]
    fn role_serializes_as_upper_case_string() {
        let json = serde_json::to_string(&AgentRole::Artisan).unwrap();
        assert_eq!(json, "\"ARTISAN\"");
        let role: AgentRole = serde_json::from_str("\"guide\"").unwrap();
        assert_eq!(role, AgentRole::Guide);
    }
}
