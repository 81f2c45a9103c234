//! Order → `order` sync, keyed by order number.
//!
//! Only paid orders are pushed. The last pushed status triple is kept in
//! `order_sync`; an order whose triple has not changed since is reported
//! as a success without touching InfoPlus.
//!
//! ```text
//!   paid order ──► triple == last synced? ──yes──► ok, zero writes
//!                        │ no
//!                        ▼
//!          customerOrderNo lookup ──► PUT {orderNo} | POST
//!                        │
//!                        ▼
//!          order_sync ← (orderNo, triple)
//! ```
//!
//! If the lookup finds a different `orderNo` than the last record, the
//! record is re-keyed so only the live remote order stays pending.

use tracing::{debug, info, warn};

use super::{item_result, ItemOutcome, SyncEngine};
use crate::endpoints::Lookup;
use crate::error::SyncResult;
use infoplus_core::payload::{remote_id, remote_id_field, OrderPayload};
use infoplus_core::validation::{validate_order_number, validate_quantity, validate_sku};
use infoplus_core::{EntityType, ItemResult, Order, SyncKind, SyncOutcome, TransactionState};

const RESOURCE: &str = "order";

impl SyncEngine {
    pub(crate) async fn sync_orders(&self) -> SyncResult<SyncOutcome> {
        let orders = self.db.orders().list_paid().await?;
        if orders.is_empty() {
            return Ok(SyncOutcome::error("No paid orders to sync"));
        }

        info!(count = orders.len(), "Syncing orders");

        let mut results = Vec::with_capacity(orders.len());
        for order in &orders {
            results.push(self.push_order(order).await);
        }

        Ok(SyncOutcome::completed(results))
    }

    /// Syncs one order by local id. Unpaid orders are refused.
    pub async fn sync_order(&self, order_id: &str) -> SyncResult<ItemResult> {
        let Some(order) = self.db.orders().get(order_id).await? else {
            return Ok(ItemResult::failed(order_id, "order not found"));
        };

        if order.transaction_state != TransactionState::Paid {
            return Ok(ItemResult::failed(
                &order.order_number,
                format!("order is not paid ({})", order.transaction_state.as_str()),
            ));
        }

        Ok(self.push_order(&order).await)
    }

    async fn push_order(&self, order: &Order) -> ItemResult {
        let outcome = self.try_push_order(order).await;
        item_result(SyncKind::Orders, &order.order_number, outcome)
    }

    async fn try_push_order(&self, order: &Order) -> ItemOutcome {
        validate_order(order)?;

        let statuses = order.status_triple();
        let last = self
            .db
            .order_sync()
            .get_order_sync_record(&order.id)
            .await
            .map_err(|e| e.to_string())?;

        if last.as_ref().map(|record| record.statuses()) == Some(statuses) {
            debug!(order_number = %order.order_number, %statuses, "Statuses unchanged, skipping");
            return Ok(());
        }

        let customer_synced = self
            .db
            .id_mappings()
            .get_remote_id(EntityType::Customer, &order.customer_id)
            .await
            .map_err(|e| e.to_string())?
            .is_some();
        if !customer_synced {
            return Err(format!(
                "customer {} has not been synced",
                order.customer_number
            ));
        }

        let api = &self.config.api;
        let payload = OrderPayload::from_order(
            order,
            self.lob_id(),
            api.warehouse_id,
            api.default_carrier_id,
        );

        let order_no = match self.remote().find_order(&order.order_number).await {
            Lookup::Failed(e) => return Err(format!("order lookup failed: {e}")),
            Lookup::Found(remote) => {
                let order_no = remote_order_no(&remote).ok_or("remote order has no orderNo")?;
                self.remote()
                    .update(RESOURCE, &payload.with_order_no(order_no))
                    .await
                    .into_result()?;
                order_no
            }
            Lookup::NotFound => {
                let created = self
                    .remote()
                    .create(RESOURCE, &payload)
                    .await
                    .into_result()?;
                let order_no = remote_order_no(&created).ok_or("create response has no orderNo")?;
                debug!(order_number = %order.order_number, order_no, "Order created");
                order_no
            }
        };

        let order_sync = self.db.order_sync();
        let written = match last.map(|record| record.remote_order_id) {
            Some(previous) if previous != order_no => {
                warn!(
                    order_number = %order.order_number,
                    previous,
                    order_no,
                    "Remote order number drifted, re-keying sync record"
                );
                order_sync
                    .replace_remote_order(&order.id, previous, order_no, statuses)
                    .await
            }
            _ => {
                order_sync
                    .update_order_sync_status(&order.id, order_no, statuses)
                    .await
            }
        };
        written.map_err(|e| e.to_string())
    }
}

fn validate_order(order: &Order) -> ItemOutcome {
    validate_order_number(&order.order_number).map_err(|e| e.to_string())?;

    if order.line_items.is_empty() {
        return Err("order has no line items".to_string());
    }
    for item in &order.line_items {
        validate_sku(&item.sku).map_err(|e| e.to_string())?;
        validate_quantity(item.quantity).map_err(|e| format!("{}: {e}", item.sku))?;
    }
    Ok(())
}

fn remote_order_no(value: &serde_json::Value) -> Option<i64> {
    remote_id_field(value, "orderNo").or_else(|| remote_id(value))
}
