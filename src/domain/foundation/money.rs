//! Monetary amounts in minor currency units.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Non-negative amount in minor units (céntimos for PEN).
///
/// Gateways charge in minor units; catalog and agent prices are stored in
/// major units and converted once with [`Money::from_major`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units.
    pub fn from_minor(minor: i64) -> Result<Self, ValidationError> {
        if minor < 0 {
            return Err(ValidationError::out_of_range(
                "amount",
                0.0,
                i64::MAX as f64,
                minor as f64,
            ));
        }
        Ok(Self(minor))
    }

    /// Converts a major-unit price (e.g. `12.34`) rounding to the nearest minor unit.
    pub fn from_major(major: f64) -> Result<Self, ValidationError> {
        if !major.is_finite() {
            return Err(ValidationError::invalid_format("amount", "not a finite number"));
        }
        let minor = (major * 100.0).round();
        if minor < 0.0 || minor > i64::MAX as f64 {
            return Err(ValidationError::out_of_range(
                "amount",
                0.0,
                i64::MAX as f64 / 100.0,
                major,
            ));
        }
        Ok(Self(minor as i64))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Amount in major units, for display and for stats.
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies by a count, saturating instead of overflowing.
    pub fn times(&self, count: u64) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(count))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
