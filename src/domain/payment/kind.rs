//! Payment kinds accepted by the charge and unlock flows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of payment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    /// Single charge, typically unlocking one agent.
    OneTime,
    /// Monthly premium subscription.
    Subscription,
    /// Catalog product purchase.
    Product,
    /// Charge against a previously saved card.
    OneClick,
}

impl PaymentKind {
    /// Parses a wire value, accepting the legacy Spanish aliases.
    ///
    /// Returns `None` for values that are not recognised; callers decide the
    /// fallback.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUBSCRIPTION" | "SUSCRIPCION" | "MENSUAL" => Some(PaymentKind::Subscription),
            "PRODUCT" | "PRODUCTO" => Some(PaymentKind::Product),
            "ONE_CLICK" => Some(PaymentKind::OneClick),
            "ONE_TIME" | "UNICO" | "POR_CONTACTO" => Some(PaymentKind::OneTime),
            _ => None,
        }
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::OneTime => "one_time",
            PaymentKind::Subscription => "subscription",
            PaymentKind::Product => "product",
            PaymentKind::OneClick => "one_click",
        }
    }

    /// Inverse of [`PaymentKind::as_str`].
    pub fn from_storage(raw: &str) -> Option<Self> {
        match raw {
            "one_time" => Some(PaymentKind::OneTime),
            "subscription" => Some(PaymentKind::Subscription),
            "product" => Some(PaymentKind::Product),
            "one_click" => Some(PaymentKind::OneClick),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
