//! Local mirror of the remote category tree.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use infoplus_core::LocalCategory;

/// Repository for local category rows.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Number of local category rows (both levels).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All categories, top level first.
    pub async fn list(&self) -> DbResult<Vec<LocalCategory>> {
        let rows = sqlx::query_as::<_, LocalCategory>(
            r#"
            SELECT id, remote_id_raw, internal_id, name, is_sub_category
            FROM categories
            ORDER BY is_sub_category, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<LocalCategory>> {
        let row = sqlx::query_as::<_, LocalCategory>(
            "SELECT id, remote_id_raw, internal_id, name, is_sub_category FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Inserts one category.
    pub async fn insert(&self, category: &LocalCategory) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, remote_id_raw, internal_id, name, is_sub_category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.remote_id_raw)
        .bind(category.internal_id)
        .bind(&category.name)
        .bind(category.is_sub_category)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a batch in one transaction (seed import).
    pub async fn insert_many(&self, categories: &[LocalCategory]) -> DbResult<usize> {
        debug!(count = categories.len(), "Seeding local categories");

        let mut tx = self.pool.begin().await?;
        for category in categories {
            sqlx::query(
                r#"
                INSERT INTO categories (id, remote_id_raw, internal_id, name, is_sub_category)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&category.id)
            .bind(&category.remote_id_raw)
            .bind(category.internal_id)
            .bind(&category.name)
            .bind(category.is_sub_category)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(categories.len())
    }

    /// Stores the remote ids assigned to a category.
    pub async fn set_remote_ids(
        &self,
        id: &str,
        remote_id_raw: &str,
        internal_id: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE categories SET remote_id_raw = ?2, internal_id = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(remote_id_raw)
        .bind(internal_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}

/// Generates a new local category id.
pub fn generate_category_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn category(name: &str, sub: bool) -> LocalCategory {
        LocalCategory {
            id: generate_category_id(),
            remote_id_raw: None,
            internal_id: None,
            name: name.to_string(),
            is_sub_category: sub,
        }
    }

    #[tokio::test]
    async fn test_seed_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();
        assert_eq!(repo.count().await.unwrap(), 0);

        let seeded = repo
            .insert_many(&[category("Tools", false), category("Hammers", true)])
            .await
            .unwrap();
        assert_eq!(seeded, 2);

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(!all[0].is_sub_category);
        assert!(all[1].is_sub_category);
    }

    #[tokio::test]
    async fn test_set_remote_ids() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();
        let cat = category("Paint", false);
        repo.insert(&cat).await.unwrap();

        repo.set_remote_ids(&cat.id, "PAINT", 12).await.unwrap();
        let stored = repo.get(&cat.id).await.unwrap().unwrap();
        assert_eq!(stored.internal_id, Some(12));
        assert_eq!(stored.remote_id_raw.as_deref(), Some("PAINT"));

        assert!(matches!(
            repo.set_remote_ids("missing", "X", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
