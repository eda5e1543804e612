//! Amount policy: payment kind to charge amount and description.
//!
//! Pure apart from the product the caller looked up beforehand. Agent
//! unlocks do not go through here; they charge the agent's access price.

use crate::domain::foundation::{AgentId, Money, ProductId, UserId};

use super::{PaymentKind, PaymentTarget, Product, TransactionError};

/// Result of pricing a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount: Money,
    pub description: String,
    pub target: PaymentTarget,
}

/// Inputs the policy needs besides the kind.
#[derive(Debug, Clone, Copy)]
pub struct QuoteRequest<'a> {
    pub user_id: &'a UserId,
    pub agent_id: Option<&'a AgentId>,
    pub product_id: Option<&'a ProductId>,
    /// Catalog lookup result for `product_id`; `None` when absent.
    pub product: Option<&'a Product>,
}

/// Fixed amounts per kind, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountPolicy {
    pub subscription_amount: Money,
    pub default_amount: Money,
}

impl Default for AmountPolicy {
    fn default() -> Self {
        Self {
            subscription_amount: Money::from_minor(1500).unwrap_or(Money::ZERO),
            default_amount: Money::from_minor(100).unwrap_or(Money::ZERO),
        }
    }
}

impl AmountPolicy {
    pub fn new(subscription_amount: Money, default_amount: Money) -> Self {
        Self {
            subscription_amount,
            default_amount,
        }
    }

    /// Prices a charge.
    ///
    /// # Errors
    ///
    /// `ProductUnavailable` when a product purchase names no product, the
    /// product is missing, or it is not available.
    pub fn quote(&self, kind: PaymentKind, req: QuoteRequest<'_>) -> Result<Quote, TransactionError> {
        match kind {
            PaymentKind::Subscription => Ok(Quote {
                amount: self.subscription_amount,
                description: format!("Monthly subscription - user {}", req.user_id),
                target: PaymentTarget::Platform,
            }),
            PaymentKind::Product => {
                let product_id = req
                    .product_id
                    .ok_or_else(|| TransactionError::product_unavailable("", "no product given"))?;
                let product = req.product.ok_or_else(|| {
                    TransactionError::product_unavailable(product_id.as_str(), "not found")
                })?;
                if !product.is_purchasable() {
                    return Err(TransactionError::product_unavailable(
                        product_id.as_str(),
                        "not available",
                    ));
                }
                Ok(Quote {
                    amount: product.price,
                    description: format!("Product purchase {}", product.id),
                    target: PaymentTarget::Product {
                        product_id: product.id.clone(),
                        owner_agent_id: product.owner_agent_id.clone(),
                    },
                })
            }
            PaymentKind::OneTime | PaymentKind::OneClick => {
                let (description, target) = match req.agent_id {
                    Some(agent_id) => (
                        format!("Contact access agent {}", agent_id),
                        PaymentTarget::Agent {
                            agent_id: agent_id.clone(),
                        },
                    ),
                    None => ("Contact access".to_string(), PaymentTarget::Platform),
                };
                Ok(Quote {
                    amount: self.default_amount,
                    description,
                    target,
                })
            }
        }
    }
}
