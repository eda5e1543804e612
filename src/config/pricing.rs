//! Pricing configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::Money;
use crate::domain::payment::AmountPolicy;
use crate::domain::subscription::SubscriptionPolicy;

/// Amounts and periods used by the charge flows.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Monthly subscription charge, minor units
    #[serde(default = "default_subscription_amount")]
    pub subscription_amount_minor: i64,

    /// Charge for one-time and unknown kinds, minor units
    #[serde(default = "default_amount")]
    pub default_amount_minor: i64,

    #[serde(default = "default_subscription_days")]
    pub subscription_days: i64,

    /// Unlock price of agents without their own, major units
    #[serde(default = "default_access_price")]
    pub default_access_price: f64,
}

impl PricingConfig {
    pub fn amount_policy(&self) -> Result<AmountPolicy, ValidationError> {
        let subscription = Money::from_minor(self.subscription_amount_minor)
            .map_err(|_| ValidationError::InvalidPrice("subscription_amount_minor"))?;
        let default = Money::from_minor(self.default_amount_minor)
            .map_err(|_| ValidationError::InvalidPrice("default_amount_minor"))?;
        Ok(AmountPolicy::new(subscription, default))
    }

    pub fn subscription_policy(&self) -> SubscriptionPolicy {
        SubscriptionPolicy::new(self.subscription_days)
    }

    pub fn default_access_price(&self) -> Result<Money, ValidationError> {
        Money::from_major(self.default_access_price)
            .map_err(|_| ValidationError::InvalidPrice("default_access_price"))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.amount_policy()?;
        self.default_access_price()?;
        if self.subscription_days < 1 {
            return Err(ValidationError::InvalidSubscriptionPeriod);
        }
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            subscription_amount_minor: default_subscription_amount(),
            default_amount_minor: default_amount(),
            subscription_days: default_subscription_days(),
            default_access_price: default_access_price(),
        }
    }
}

fn default_subscription_amount() -> i64 {
    1500
}

fn default_amount() -> i64 {
    100
}

fn default_subscription_days() -> i64 {
    SubscriptionPolicy::DEFAULT_PERIOD_DAYS
}

fn default_access_price() -> f64 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_amount_policy_defaults() {
        let config = PricingConfig::default();
        assert_eq!(config.amount_policy().unwrap(), AmountPolicy::default());
        assert_eq!(config.default_access_price().unwrap().minor_units(), 1000);
        assert_eq!(config.subscription_policy().period_days(), 30);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let config = PricingConfig {
            default_amount_minor: -1,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidPrice("default_amount_minor"))
        );
    }

    #[test]
    fn test_non_finite_access_price_rejected() {
        let config = PricingConfig {
            default_access_price: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_day_period_rejected() {
        let config = PricingConfig {
            subscription_days: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSubscriptionPeriod));
    }
}
