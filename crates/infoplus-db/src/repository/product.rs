//! # Product Repository
//!
//! Products are owned by the storefront. The sync writes back exactly two
//! things:
//!
//! - the major/sub group classification, when backfilled from InfoPlus
//! - the stock level, from the inventory pull

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use infoplus_core::Product;

const SELECT_COLUMNS: &str = r#"
    SELECT id, sku, name, description, ean, weight_kg, category_id,
           major_group_id, sub_group_id, stock, active, updated_at
    FROM products
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Products that take part in the sync, ordered by SKU.
    pub async fn list_for_sync(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_COLUMNS} WHERE active = 1 ORDER BY sku"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_COLUMNS} WHERE sku = ?1"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, ean, weight_kg, category_id,
                major_group_id, sub_group_id, stock, active, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.ean)
        .bind(product.weight_kg)
        .bind(&product.category_id)
        .bind(product.major_group_id)
        .bind(product.sub_group_id)
        .bind(product.stock)
        .bind(product.active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stores the major/sub group classification.
    pub async fn set_classification(
        &self,
        id: &str,
        major_group_id: i64,
        sub_group_id: i64,
    ) -> DbResult<()> {
        debug!(id = %id, major_group_id, sub_group_id, "Backfilling classification");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET major_group_id = ?2, sub_group_id = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(major_group_id)
        .bind(sub_group_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Sets the absolute stock level for a SKU.
    ///
    /// Returns false when no product has that SKU.
    pub async fn set_stock_by_sku(&self, sku: &str, stock: i64) -> DbResult<bool> {
        let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE sku = ?1")
            .bind(sku)
            .bind(stock)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn product(id: &str, sku: &str) -> Product {
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            ean: None,
            weight_kg: Some(0.5),
            category_id: None,
            major_group_id: None,
            sub_group_id: None,
            stock: 0,
            active: true,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_for_sync_skips_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p2", "B-2")).await.unwrap();
        repo.insert(&product("p1", "A-1")).await.unwrap();
        let mut inactive = product("p3", "C-3");
        inactive.active = false;
        repo.insert(&inactive).await.unwrap();

        let skus: Vec<_> = repo
            .list_for_sync()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.sku)
            .collect();
        assert_eq!(skus, vec!["A-1", "B-2"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_classification_and_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("p1", "ABC123")).await.unwrap();

        repo.set_classification("p1", 4, 8).await.unwrap();
        assert!(repo.set_stock_by_sku("ABC123", 17).await.unwrap());
        assert!(!repo.set_stock_by_sku("NOPE", 1).await.unwrap());

        let stored = repo.get_by_sku("ABC123").await.unwrap().unwrap();
        assert_eq!(stored.classification(), Some((4, 8)));
        assert_eq!(stored.stock, 17);
        assert_eq!(stored.weight_kg, Some(0.5));

        assert!(matches!(
            repo.set_classification("missing", 1, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
