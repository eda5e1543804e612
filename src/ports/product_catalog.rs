//! Product catalog port (read-only).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProductId};
use crate::domain::payment::Product;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError>;
}
