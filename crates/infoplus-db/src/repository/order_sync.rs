//! # Order Sync Repository
//!
//! Last reconciled status triple per `(local_order_id, remote_order_id)`.
//! The order sync compares against it before pushing; the reconciler reads
//! the pending-shipment subset.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use infoplus_core::{DeliveryState, OrderSyncRecord, StatusTriple, TransactionState};

const SELECT_COLUMNS: &str = r#"
    SELECT id, local_order_id, remote_order_id, sync_date,
           order_status, shipping_status, payment_status
    FROM order_sync
"#;

/// Repository for order sync records.
#[derive(Debug, Clone)]
pub struct OrderSyncRepository {
    pool: SqlitePool,
}

impl OrderSyncRepository {
    /// Creates a new OrderSyncRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderSyncRepository { pool }
    }

    /// Inserts a new record. Fails with `UniqueViolation` if the pair exists.
    pub async fn create_order_sync(
        &self,
        local_order_id: &str,
        remote_order_id: i64,
        statuses: StatusTriple,
    ) -> DbResult<OrderSyncRecord> {
        debug!(
            local_order_id = %local_order_id,
            remote_order_id,
            statuses = %statuses,
            "Creating order sync record"
        );

        let id = sqlx::query(
            r#"
            INSERT INTO order_sync (
                local_order_id, remote_order_id, sync_date,
                order_status, shipping_status, payment_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(local_order_id)
        .bind(remote_order_id)
        .bind(Utc::now())
        .bind(statuses.order)
        .bind(statuses.shipping)
        .bind(statuses.payment)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let record = sqlx::query_as::<_, OrderSyncRecord>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    /// Writes the status triple for an order, creating the record if needed.
    pub async fn update_order_sync_status(
        &self,
        local_order_id: &str,
        remote_order_id: i64,
        statuses: StatusTriple,
    ) -> DbResult<()> {
        debug!(
            local_order_id = %local_order_id,
            remote_order_id,
            statuses = %statuses,
            "Updating order sync status"
        );

        sqlx::query(
            r#"
            INSERT INTO order_sync (
                local_order_id, remote_order_id, sync_date,
                order_status, shipping_status, payment_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (local_order_id, remote_order_id) DO UPDATE SET
                sync_date = excluded.sync_date,
                order_status = excluded.order_status,
                shipping_status = excluded.shipping_status,
                payment_status = excluded.payment_status
            "#,
        )
        .bind(local_order_id)
        .bind(remote_order_id)
        .bind(Utc::now())
        .bind(statuses.order)
        .bind(statuses.shipping)
        .bind(statuses.payment)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Re-keys a local order onto a new remote order.
    ///
    /// The record for `old_remote_order_id` is removed and the new pair is
    /// written in the same transaction, so the reconciler never sees both.
    pub async fn replace_remote_order(
        &self,
        local_order_id: &str,
        old_remote_order_id: i64,
        new_remote_order_id: i64,
        statuses: StatusTriple,
    ) -> DbResult<()> {
        debug!(
            local_order_id = %local_order_id,
            old_remote_order_id,
            new_remote_order_id,
            statuses = %statuses,
            "Replacing remote order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_sync WHERE local_order_id = ?1 AND remote_order_id = ?2")
            .bind(local_order_id)
            .bind(old_remote_order_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO order_sync (
                local_order_id, remote_order_id, sync_date,
                order_status, shipping_status, payment_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (local_order_id, remote_order_id) DO UPDATE SET
                sync_date = excluded.sync_date,
                order_status = excluded.order_status,
                shipping_status = excluded.shipping_status,
                payment_status = excluded.payment_status
            "#,
        )
        .bind(local_order_id)
        .bind(new_remote_order_id)
        .bind(Utc::now())
        .bind(statuses.order)
        .bind(statuses.shipping)
        .bind(statuses.payment)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Most recent record for a local order.
    pub async fn get_order_sync_record(
        &self,
        local_order_id: &str,
    ) -> DbResult<Option<OrderSyncRecord>> {
        let record = sqlx::query_as::<_, OrderSyncRecord>(&format!(
            "{SELECT_COLUMNS} WHERE local_order_id = ?1 ORDER BY sync_date DESC, id DESC LIMIT 1"
        ))
        .bind(local_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Records whose shipping is still open and whose payment is paid.
    pub async fn get_pending_shipment_orders(&self) -> DbResult<Vec<OrderSyncRecord>> {
        let records = sqlx::query_as::<_, OrderSyncRecord>(&format!(
            "{SELECT_COLUMNS} WHERE shipping_status = ?1 AND payment_status = ?2 ORDER BY id"
        ))
        .bind(DeliveryState::Open)
        .bind(TransactionState::Paid)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Sets only the shipping status. Returns false when no record matched.
    pub async fn update_shipping_status(
        &self,
        local_order_id: &str,
        remote_order_id: i64,
        shipping_status: DeliveryState,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE order_sync
            SET shipping_status = ?3, sync_date = ?4
            WHERE local_order_id = ?1 AND remote_order_id = ?2
            "#,
        )
        .bind(local_order_id)
        .bind(remote_order_id)
        .bind(shipping_status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
