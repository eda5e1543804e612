//! Catalog products, read-only from this service's point of view.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AgentId, Money, ProductId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Agent credited with the sale.
    pub owner_agent_id: AgentId,
    pub name: String,
    pub price: Money,
    pub available: bool,
}

impl Product {
    pub fn is_purchasable(&self) -> bool {
        self.available
    }
}
