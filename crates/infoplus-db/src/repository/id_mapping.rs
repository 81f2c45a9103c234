//! # Id Mapping Repository
//!
//! Persistent link between local entity ids and InfoPlus ids.
//!
//! ## Upsert Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_or_update_mapping(entity, local_id, remote_id)                  │
//! │                                                                         │
//! │  remote_id = Some(r)                                                    │
//! │    INSERT ... ON CONFLICT (entity_type, local_id)                       │
//! │      DO UPDATE SET remote_id = r, updated_at = now                      │
//! │                                                                         │
//! │  remote_id = None (kinds where the remote returns no id)                │
//! │    existing row?  → keep its remote_id                                  │
//! │    otherwise      → MAX(remote_id WHERE entity_type) + 1                │
//! │                                                                         │
//! │  Concurrent callers with the same key converge on one row.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use infoplus_core::{EntityType, IdMapping};

/// Repository for id mapping rows.
#[derive(Debug, Clone)]
pub struct IdMappingRepository {
    pool: SqlitePool,
}

impl IdMappingRepository {
    /// Creates a new IdMappingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IdMappingRepository { pool }
    }

    /// Remote id mapped to a local entity, if any.
    pub async fn get_remote_id(
        &self,
        entity_type: EntityType,
        local_id: &str,
    ) -> DbResult<Option<i64>> {
        let remote_id: Option<i64> = sqlx::query_scalar(
            "SELECT remote_id FROM id_mapping WHERE entity_type = ?1 AND local_id = ?2",
        )
        .bind(entity_type)
        .bind(local_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(remote_id)
    }

    /// Full mapping row for a local entity.
    pub async fn get_mapping(
        &self,
        entity_type: EntityType,
        local_id: &str,
    ) -> DbResult<Option<IdMapping>> {
        let mapping = sqlx::query_as::<_, IdMapping>(
            r#"
            SELECT id, entity_type, local_id, remote_id, created_at, updated_at
            FROM id_mapping
            WHERE entity_type = ?1 AND local_id = ?2
            "#,
        )
        .bind(entity_type)
        .bind(local_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    /// Creates or updates the mapping for `(entity_type, local_id)`.
    ///
    /// Returns the remote id stored.
    pub async fn create_or_update_mapping(
        &self,
        entity_type: EntityType,
        local_id: &str,
        remote_id: Option<i64>,
    ) -> DbResult<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let remote_id = match remote_id {
            Some(id) => id,
            None => {
                let existing: Option<i64> = sqlx::query_scalar(
                    "SELECT remote_id FROM id_mapping WHERE entity_type = ?1 AND local_id = ?2",
                )
                .bind(entity_type)
                .bind(local_id)
                .fetch_optional(&mut *tx)
                .await?;

                match existing {
                    Some(id) => id,
                    None => {
                        let next: i64 = sqlx::query_scalar(
                            "SELECT COALESCE(MAX(remote_id), 0) + 1 FROM id_mapping WHERE entity_type = ?1",
                        )
                        .bind(entity_type)
                        .fetch_one(&mut *tx)
                        .await?;
                        next
                    }
                }
            }
        };

        debug!(
            entity_type = %entity_type,
            local_id = %local_id,
            remote_id,
            "Upserting id mapping"
        );

        sqlx::query(
            r#"
            INSERT INTO id_mapping (entity_type, local_id, remote_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT (entity_type, local_id) DO UPDATE SET
                remote_id = excluded.remote_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entity_type)
        .bind(local_id)
        .bind(remote_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(remote_id)
    }

    /// Bumps `updated_at` without changing the mapping.
    ///
    /// Returns false when no mapping exists.
    pub async fn touch_updated_at(&self, entity_type: EntityType, local_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE id_mapping SET updated_at = ?3 WHERE entity_type = ?1 AND local_id = ?2",
        )
        .bind(entity_type)
        .bind(local_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a mapping. Returns false when none existed.
    pub async fn delete_mapping(&self, entity_type: EntityType, local_id: &str) -> DbResult<bool> {
        debug!(entity_type = %entity_type, local_id = %local_id, "Deleting id mapping");

        let result = sqlx::query("DELETE FROM id_mapping WHERE entity_type = ?1 AND local_id = ?2")
            .bind(entity_type)
            .bind(local_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of mappings of one kind (for diagnostics).
    pub async fn count(&self, entity_type: EntityType) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM id_mapping WHERE entity_type = ?1")
            .bind(entity_type)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
