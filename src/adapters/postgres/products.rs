//! PostgreSQL implementation of ProductCatalog.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ProductId};
use crate::domain::payment::Product;
use crate::ports::ProductCatalog;

use super::rows::{db_error, ProductRow};

pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn find_by_id(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, owner_agent_id, name, price_minor, available FROM products WHERE id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to read product", e))?;
        row.map(Product::try_from).transpose()
    }
}
